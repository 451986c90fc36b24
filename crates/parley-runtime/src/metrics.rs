//! Alignment quality measures.

use parley_agents::alignment::Alignment;
use parley_core::types::SymbolMap;
use serde::{Deserialize, Serialize};

/// Precision and recall of an alignment against the ground truth.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Score {
    pub precision: f64,
    pub recall: f64,
}

impl Score {
    pub const PERFECT: Score = Score {
        precision: 1.0,
        recall: 1.0,
    };

    pub fn new(precision: f64, recall: f64) -> Self {
        Self { precision, recall }
    }

    pub fn of(alignment: &Alignment, reference: &SymbolMap) -> Self {
        let (precision, recall) = alignment.precision_recall(reference);
        Self { precision, recall }
    }

    pub fn f_score(&self) -> f64 {
        f_score(self.precision, self.recall)
    }

    pub fn is_perfect(&self) -> bool {
        self.precision == 1.0 && self.recall == 1.0
    }
}

/// Harmonic mean; zero when both inputs are zero.
pub fn f_score(precision: f64, recall: f64) -> f64 {
    let total = precision + recall;
    if total == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / total
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Point-wise mean of several runs. Runs shorter than the longest count as
/// converged for their missing tail.
pub fn mean_curve(runs: &[Vec<Score>]) -> Vec<Score> {
    let len = runs.iter().map(Vec::len).max().unwrap_or(0);
    if runs.is_empty() {
        return Vec::new();
    }
    let n = runs.len() as f64;
    (0..len)
        .map(|i| {
            let (p, r) = runs.iter().fold((0.0, 0.0), |(p, r), run| {
                let s = run.get(i).copied().unwrap_or(Score::PERFECT);
                (p + s.precision, r + s.recall)
            });
            Score::new(p / n, r / n)
        })
        .collect()
}
