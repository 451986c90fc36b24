//! Repeated interactions between two fresh agents, with learning curves.
//!
//! Agent 0 speaks `V0`; agent 1 speaks the same words with a `1` suffix, so
//! the ground-truth alignment is known. Every repetition starts from fresh
//! agents and plays the whole corpus in order, stopping early once both
//! agents read every heard symbol correctly.

use crate::corpus::{GeneratorConfig, ProtocolGenerator};
use crate::error::RuntimeResult;
use crate::exchange::Exchange;
use crate::metrics::{self, mean_curve, Score};
use parley_agents::agent::{Agent, AgentBuilder, AgentKind};
use parley_agents::config::LearningConfig;
use parley_core::error::{ParleyError, Result};
use parley_core::protocol::Protocol;
use parley_core::types::{invert, AgentId, Symbol, SymbolMap, TurnPattern};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

/// Unique identifier for one experiment run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Experiment configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub agent: AgentKind,
    /// The vocabulary of agent 0.
    pub vocabulary: Vec<Symbol>,
    /// Interactions per repetition.
    pub interactions: usize,
    pub repetitions: usize,
    /// Turns per interaction; `|V| + 2` when unset.
    pub bound: Option<usize>,
    pub seed: Option<u64>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            agent: AgentKind::Simple,
            vocabulary: ["o", "s", "x", "z"].iter().map(|s| Symbol::from(*s)).collect(),
            interactions: 200,
            repetitions: 5,
            bound: None,
            seed: None,
        }
    }
}

impl ExperimentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.vocabulary.is_empty() {
            return Err(ParleyError::invalid_config("vocabulary", "[]", "must not be empty"));
        }
        if self.interactions == 0 {
            return Err(ParleyError::invalid_config("interactions", "0", "must be positive"));
        }
        if self.repetitions == 0 {
            return Err(ParleyError::invalid_config("repetitions", "0", "must be positive"));
        }
        if self.bound == Some(0) {
            return Err(ParleyError::invalid_config("bound", "0", "must be positive"));
        }
        Ok(())
    }

    pub fn bound(&self) -> usize {
        self.bound.unwrap_or(self.vocabulary.len() + 2)
    }

    /// `V0 → V1`, each symbol mapped to itself with a `1` suffix.
    pub fn translation(&self) -> SymbolMap {
        self.vocabulary
            .iter()
            .map(|s| (s.clone(), Symbol::new(format!("{}1", s))))
            .collect()
    }
}

/// Averaged results of an experiment.
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentReport {
    pub run_id: RunId,
    pub agent: AgentKind,
    /// Strategy label, e.g. `plain/frequency/none`.
    pub label: String,
    /// Mean precision/recall after each interaction, per agent.
    pub curves: [Vec<Score>; 2],
    /// Mean F-score of both agents after each interaction.
    pub f_scores: Vec<f64>,
    /// Interaction index of full convergence per repetition, or twice the
    /// interaction count when a repetition never converged.
    pub convergence: Vec<usize>,
    pub mean_convergence: f64,
    /// Successful interactions per repetition, per agent.
    pub successes: [Vec<usize>; 2],
    pub mean_exchange_ms: f64,
}

impl ExperimentReport {
    pub fn final_f_score(&self) -> f64 {
        self.f_scores.last().copied().unwrap_or(0.0)
    }
}

pub struct Experiment {
    config: ExperimentConfig,
    learning: LearningConfig,
    generator: GeneratorConfig,
    exchange: Exchange,
    corpus: Option<Vec<Protocol>>,
}

impl Experiment {
    pub fn new(config: ExperimentConfig) -> Self {
        Self {
            config,
            learning: LearningConfig::default(),
            generator: GeneratorConfig::default(),
            exchange: Exchange::default(),
            corpus: None,
        }
    }

    pub fn with_learning(mut self, learning: LearningConfig) -> Self {
        self.learning = learning;
        self
    }

    pub fn with_generator(mut self, generator: GeneratorConfig) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_exchange(mut self, exchange: Exchange) -> Self {
        self.exchange = exchange;
        self
    }

    /// Play these protocols instead of generating a corpus. They are
    /// cycled if there are fewer than `interactions`.
    pub fn with_corpus(mut self, corpus: Vec<Protocol>) -> Self {
        self.corpus = Some(corpus);
        self
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// Alternating turns, `bound` long.
    pub fn pattern(&self) -> Result<TurnPattern> {
        TurnPattern::alternating(self.config.bound())
    }

    fn corpus(&self, pattern: &TurnPattern) -> RuntimeResult<Vec<Protocol>> {
        if let Some(corpus) = &self.corpus {
            if corpus.is_empty() {
                return Err(ParleyError::invalid_config("corpus", "[]", "must not be empty").into());
            }
            return Ok(corpus.clone());
        }
        let mut generator = ProtocolGenerator::new(
            self.config.vocabulary.clone(),
            pattern.clone(),
            self.generator.clone(),
            self.config.seed,
        )?;
        let prefix = format!("p{}-{}-", self.config.vocabulary.len(), self.generator.size);
        generator.corpus(&prefix, self.config.interactions)
    }

    fn agent(&self, id: AgentId, vocabulary: Vec<Symbol>, repetition: usize) -> Result<Agent> {
        let mut builder = AgentBuilder::new(id, vocabulary)
            .kind(self.config.agent)
            .config(self.learning.clone());
        if let Some(seed) = self.config.seed {
            let offset = (repetition as u64) * 2 + id.as_u8() as u64 + 1;
            builder = builder.seed(seed.wrapping_add(offset));
        }
        builder.build()
    }

    pub async fn run(&self) -> RuntimeResult<ExperimentReport> {
        self.config.validate()?;
        self.learning.validate()?;
        let pattern = self.pattern()?;
        let corpus = self.corpus(&pattern)?;
        let forward = self.config.translation();
        let backward = invert(&forward);
        let translated = corpus
            .iter()
            .map(|p| p.translate(&forward))
            .collect::<Result<Vec<_>>>()?;

        let n = self.config.interactions;
        let v0 = self.config.vocabulary.clone();
        let v1: Vec<Symbol> = v0.iter().filter_map(|s| forward.get(s).cloned()).collect();
        let run_id = RunId::new();
        info!(%run_id, agent = %self.config.agent, interactions = n, repetitions = self.config.repetitions, "Experiment started");

        let mut runs: [Vec<Vec<Score>>; 2] = [Vec::new(), Vec::new()];
        let mut convergence = Vec::with_capacity(self.config.repetitions);
        let mut successes: [Vec<usize>; 2] = [Vec::new(), Vec::new()];
        let mut times: Vec<Duration> = Vec::new();
        let mut label = String::new();

        for repetition in 0..self.config.repetitions {
            let mut first = self.agent(AgentId::FIRST, v0.clone(), repetition)?;
            let mut second = self.agent(AgentId::SECOND, v1.clone(), repetition)?;
            label = first.label();

            let mut curve_first = Vec::with_capacity(n);
            let mut curve_second = Vec::with_capacity(n);
            let mut converged = None;
            for (j, (p0, p1)) in corpus.iter().zip(&translated).cycle().take(n).enumerate() {
                let report = self
                    .exchange
                    .run(first, second, p0.clone(), p1.clone(), pattern.clone())
                    .await?;
                times.push(report.elapsed);
                (first, second) = report.into_agents();

                let s0 = Score::of(first.alignment(), &backward);
                let s1 = Score::of(second.alignment(), &forward);
                curve_first.push(s0);
                curve_second.push(s1);
                if s0.is_perfect() && s1.is_perfect() {
                    converged = Some(j);
                    break;
                }
            }
            curve_first.resize(n, Score::PERFECT);
            curve_second.resize(n, Score::PERFECT);

            let point = converged.unwrap_or(n * 2);
            debug!(%run_id, repetition, convergence = point, "Repetition finished");
            convergence.push(point);
            successes[0].push(first.outcomes().iter().filter(|o| o.is_success()).count());
            successes[1].push(second.outcomes().iter().filter(|o| o.is_success()).count());
            runs[0].push(curve_first);
            runs[1].push(curve_second);
        }

        let curves = [mean_curve(&runs[0]), mean_curve(&runs[1])];
        let f_scores = curves[0]
            .iter()
            .zip(&curves[1])
            .map(|(a, b)| (a.f_score() + b.f_score()) / 2.0)
            .collect();
        let mean_convergence = metrics::mean(&convergence.iter().map(|&c| c as f64).collect::<Vec<_>>());
        let millis: Vec<f64> = times.iter().map(|t| t.as_secs_f64() * 1000.0).collect();

        let report = ExperimentReport {
            run_id,
            agent: self.config.agent,
            label,
            curves,
            f_scores,
            convergence,
            mean_convergence,
            successes,
            mean_exchange_ms: metrics::mean(&millis),
        };
        info!(%run_id, final_f = report.final_f_score(), mean_convergence, "Experiment finished");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translation_appends_suffix() {
        let config = ExperimentConfig::default();
        let map = config.translation();
        assert_eq!(map.get(&Symbol::from("o")), Some(&Symbol::from("o1")));
        assert_eq!(config.bound(), 6);
    }

    #[test]
    fn validation_rejects_empty_runs() {
        let config = ExperimentConfig {
            interactions: 0,
            ..ExperimentConfig::default()
        };
        assert!(config.validate().is_err());
        let config = ExperimentConfig {
            vocabulary: Vec::new(),
            ..ExperimentConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn run_ids_are_unique() {
        assert_ne!(RunId::new(), RunId::new());
    }
}
