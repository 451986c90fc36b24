//! Confidence tables between a foreign and a native vocabulary.
//!
//! An [`Alignment`] maps each foreign symbol heard so far to a row of scores
//! over the agent's own vocabulary. Rows are created lazily, the first time
//! the foreign symbol is received. [`MappingsMade`] is the per-interaction
//! working map that keeps one exchange internally consistent.

use parley_core::types::{Symbol, SymbolMap};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scores over the native vocabulary for one foreign symbol.
pub type Row = BTreeMap<Symbol, f64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alignment {
    vocabulary: Vec<Symbol>,
    table: BTreeMap<Symbol, Row>,
    prior: SymbolMap,
    prior_boost: f64,
}

impl Alignment {
    pub fn new(vocabulary: Vec<Symbol>) -> Self {
        Self {
            vocabulary,
            table: BTreeMap::new(),
            prior: SymbolMap::new(),
            prior_boost: 0.0,
        }
    }

    /// Seed the table from a prior foreign-to-native alignment. Prior pairs
    /// start at `1 + boost`, every other pair at `1`, then rows are
    /// normalised. Foreign symbols outside the prior start uniform.
    pub fn with_prior(vocabulary: Vec<Symbol>, prior: SymbolMap, boost: f64) -> Self {
        let mut alignment = Self {
            vocabulary,
            table: BTreeMap::new(),
            prior,
            prior_boost: boost,
        };
        let seeded: Vec<Symbol> = alignment.prior.keys().cloned().collect();
        for foreign in &seeded {
            alignment.ensure(foreign);
        }
        alignment
    }

    /// A table holding exactly one certain pair per foreign symbol.
    pub fn from_mapping(vocabulary: Vec<Symbol>, mapping: &SymbolMap) -> Self {
        let mut alignment = Self::new(vocabulary);
        for (foreign, native) in mapping {
            let row = alignment
                .vocabulary
                .iter()
                .map(|v| (v.clone(), if v == native { 1.0 } else { 0.0 }))
                .collect();
            alignment.table.insert(foreign.clone(), row);
        }
        alignment
    }

    pub fn vocabulary(&self) -> &[Symbol] {
        &self.vocabulary
    }

    pub fn contains(&self, foreign: &Symbol) -> bool {
        self.table.contains_key(foreign)
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn foreign_symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.table.keys()
    }

    pub fn row(&self, foreign: &Symbol) -> Option<&Row> {
        self.table.get(foreign)
    }

    /// Create the row for `foreign` if it has never been heard.
    pub fn ensure(&mut self, foreign: &Symbol) {
        if self.table.contains_key(foreign) {
            return;
        }
        let row: Row = match self.prior.get(foreign) {
            Some(native) => {
                let mut row: Row = self
                    .vocabulary
                    .iter()
                    .map(|v| (v.clone(), if v == native { 1.0 + self.prior_boost } else { 1.0 }))
                    .collect();
                normalize_row(&mut row);
                row
            }
            None => {
                let uniform = 1.0 / self.vocabulary.len().max(1) as f64;
                self.vocabulary.iter().map(|v| (v.clone(), uniform)).collect()
            }
        };
        self.table.insert(foreign.clone(), row);
    }

    pub fn score(&self, foreign: &Symbol, native: &Symbol) -> f64 {
        self.table
            .get(foreign)
            .and_then(|row| row.get(native))
            .copied()
            .unwrap_or(0.0)
    }

    /// Overwrite one score, clamped at zero.
    pub fn set(&mut self, foreign: &Symbol, native: &Symbol, value: f64) {
        if let Some(slot) = self.table.get_mut(foreign).and_then(|row| row.get_mut(native)) {
            *slot = value.max(0.0);
        }
    }

    /// `score -= fraction * score`.
    pub fn discount(&mut self, foreign: &Symbol, native: &Symbol, fraction: f64) {
        let current = self.score(foreign, native);
        self.set(foreign, native, current - fraction * current);
    }

    /// `score += amount`.
    pub fn boost(&mut self, foreign: &Symbol, native: &Symbol, amount: f64) {
        let current = self.score(foreign, native);
        self.set(foreign, native, current + amount);
    }

    /// Rescale one row to sum to 1. Rows summing to zero are left alone.
    pub fn normalize(&mut self, foreign: &Symbol) {
        if let Some(row) = self.table.get_mut(foreign) {
            normalize_row(row);
        }
    }

    pub fn normalize_all(&mut self) {
        for row in self.table.values_mut() {
            normalize_row(row);
        }
    }

    /// Native candidates for `foreign` by descending score. The vocabulary is
    /// shuffled first so that the stable sort breaks ties at random.
    pub fn ranked(&self, foreign: &Symbol, rng: &mut StdRng) -> Vec<Symbol> {
        let mut candidates = self.vocabulary.clone();
        candidates.shuffle(rng);
        candidates.sort_by(|a, b| self.score(foreign, b).total_cmp(&self.score(foreign, a)));
        candidates
    }

    /// The single highest-scoring native symbol, or `None` on a tie.
    pub fn best(&self, foreign: &Symbol) -> Option<&Symbol> {
        let row = self.table.get(foreign)?;
        let max = row.values().copied().fold(f64::NEG_INFINITY, f64::max);
        let mut top = row.iter().filter(|(_, s)| **s == max);
        let (native, _) = top.next()?;
        if top.next().is_some() {
            None
        } else {
            Some(native)
        }
    }

    /// How clearly one foreign symbol stands out as the reading of `native`:
    /// mean gap between the top score in that column and every other score.
    /// Zero when the top score is shared.
    pub fn certainty(&self, native: &Symbol) -> f64 {
        let column: Vec<f64> = self.table.values().filter_map(|row| row.get(native).copied()).collect();
        if column.is_empty() {
            return 0.0;
        }
        let max = column.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if column.iter().filter(|s| **s == max).count() > 1 {
            return 0.0;
        }
        column.iter().map(|s| max - s).sum::<f64>() / column.len() as f64
    }

    /// Precision and recall of the best-reading mapping against `reference`
    /// (foreign to native). Tied rows count as incorrect.
    pub fn precision_recall(&self, reference: &SymbolMap) -> (f64, f64) {
        if self.table.is_empty() {
            return (0.0, 0.0);
        }
        let correct = self
            .best_mapping()
            .iter()
            .filter(|(f, n)| reference.get(*f) == Some(*n))
            .count() as f64;
        let precision = correct / self.table.len() as f64;
        let recall = if reference.is_empty() {
            0.0
        } else {
            correct / reference.len() as f64
        };
        (precision, recall)
    }

    /// The best reading of every foreign symbol that has one.
    pub fn best_mapping(&self) -> SymbolMap {
        self.table
            .keys()
            .filter_map(|f| self.best(f).map(|n| (f.clone(), n.clone())))
            .collect()
    }
}

fn normalize_row(row: &mut Row) {
    let total: f64 = row.values().sum();
    if total > 0.0 {
        for score in row.values_mut() {
            *score /= total;
        }
    }
}

/// Per-interaction commitments: foreign symbol to chosen native symbol.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingsMade {
    map: BTreeMap<Symbol, Symbol>,
}

impl MappingsMade {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, foreign: &Symbol) -> Option<&Symbol> {
        self.map.get(foreign)
    }

    pub fn commit(&mut self, foreign: Symbol, native: Symbol) {
        self.map.insert(foreign, native);
    }

    /// The foreign symbol `native` is committed to, if any.
    pub fn foreign_for(&self, native: &Symbol) -> Option<&Symbol> {
        self.map.iter().find(|(_, n)| *n == native).map(|(f, _)| f)
    }

    /// Whether `native` already reads some foreign symbol other than `foreign`.
    pub fn claimed_by_other(&self, native: &Symbol, foreign: &Symbol) -> bool {
        self.map.iter().any(|(f, n)| n == native && f != foreign)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &Symbol)> {
        self.map.iter()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }
}
