//! Protocol corpora: random generation, loading and saving.
//!
//! Generated protocols are built rule by rule; a rule is kept only if the
//! protocol still admits at least one complete history along the turn
//! pattern, so every protocol in a corpus can be played to completion.

use crate::error::{RuntimeError, RuntimeResult};
use parley_core::engine;
use parley_core::error::{ParleyError, Result};
use parley_core::protocol::Protocol;
use parley_core::rule::{RelationKind, Rule};
use parley_core::types::{AgentId, Symbol, TurnPattern};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const AGENTS: [AgentId; 2] = [AgentId::FIRST, AgentId::SECOND];

/// Generator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Rules per protocol.
    pub size: usize,
    /// Share of positive existential rules, rounded up.
    pub positive_share: f64,
    /// Full restarts before giving up on one protocol.
    pub max_attempts: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            size: 8,
            positive_share: 0.1,
            max_attempts: 50,
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<()> {
        ParleyError::check_unit("positive_share", self.positive_share)?;
        if self.max_attempts == 0 {
            return Err(ParleyError::invalid_config("max_attempts", "0", "must be positive"));
        }
        Ok(())
    }

    fn positive_count(&self) -> usize {
        (self.positive_share * self.size as f64).ceil() as usize
    }
}

/// Random satisfiable protocols over one vocabulary.
#[derive(Debug)]
pub struct ProtocolGenerator {
    vocabulary: Vec<Symbol>,
    pattern: TurnPattern,
    config: GeneratorConfig,
    rng: StdRng,
}

impl ProtocolGenerator {
    pub fn new(vocabulary: Vec<Symbol>, pattern: TurnPattern, config: GeneratorConfig, seed: Option<u64>) -> RuntimeResult<Self> {
        config.validate()?;
        if vocabulary.is_empty() {
            return Err(ParleyError::invalid_config("vocabulary", "[]", "must not be empty").into());
        }
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            vocabulary,
            pattern,
            config,
            rng,
        })
    }

    pub fn pattern(&self) -> &TurnPattern {
        &self.pattern
    }

    /// Positive existentials for every symbol and speaker.
    pub fn positive_pool(&self) -> Vec<Rule> {
        self.vocabulary
            .iter()
            .flat_map(|s| AGENTS.iter().map(move |&ag| Rule::existential(s.clone(), ag, true)))
            .collect()
    }

    /// Everything else: negative existentials and relations of both
    /// polarities.
    pub fn other_pool(&self) -> Vec<Rule> {
        let v = &self.vocabulary;
        let mut pool: Vec<Rule> = v
            .iter()
            .flat_map(|s| AGENTS.iter().map(move |&ag| Rule::existential(s.clone(), ag, false)))
            .collect();

        let pairs = || {
            v.iter()
                .flat_map(move |a| v.iter().filter(move |b| *b != a).map(move |b| (a, b)))
        };
        for kind in [RelationKind::Correlation, RelationKind::Response, RelationKind::Before] {
            for positive in [true, false] {
                for (a, b) in pairs() {
                    for ag in AGENTS {
                        for agr in AGENTS {
                            pool.push(Rule::relation(a.clone(), b.clone(), kind, positive, ag, agr));
                        }
                    }
                }
            }
        }
        // adjacency rules only across speakers
        for kind in [RelationKind::ImmediatelyAfter, RelationKind::Premise] {
            for positive in [true, false] {
                for (a, b) in pairs() {
                    pool.push(Rule::relation(a.clone(), b.clone(), kind, positive, AgentId::SECOND, AgentId::FIRST));
                    pool.push(Rule::relation(a.clone(), b.clone(), kind, positive, AgentId::FIRST, AgentId::SECOND));
                }
            }
        }
        pool
    }

    /// Generate one protocol of `config.size` rules.
    pub fn generate(&mut self, name: impl Into<String>) -> RuntimeResult<Protocol> {
        let name = name.into();
        for attempt in 1..=self.config.max_attempts {
            let mut protocol = Protocol::new(self.vocabulary.clone(), Vec::new(), name.clone());
            let mut positives = self.positive_pool();
            let wanted_positive = self.config.positive_count().min(positives.len());
            let wanted_other = self.config.size.saturating_sub(wanted_positive);

            self.draw(&mut protocol, &mut positives, wanted_positive);
            let mut others = self.other_pool();
            self.draw(&mut protocol, &mut others, wanted_other);

            if protocol.rules().len() == self.config.size {
                debug!(%name, attempt, "Generated protocol");
                return Ok(protocol);
            }
            debug!(%name, attempt, rules = protocol.rules().len(), "Restarting generation");
        }
        warn!(%name, attempts = self.config.max_attempts, "Protocol generation gave up");
        Err(RuntimeError::Generation(format!(
            "no satisfiable protocol of {} rules after {} attempts",
            self.config.size, self.config.max_attempts
        )))
    }

    /// Add up to `count` rules from `pool`, each chosen at random and kept
    /// only if the protocol stays satisfiable.
    fn draw(&mut self, protocol: &mut Protocol, pool: &mut Vec<Rule>, count: usize) {
        for _ in 0..count {
            while !pool.is_empty() {
                let pick = pool.swap_remove(self.rng.gen_range(0..pool.len()));
                let candidate = protocol.with_rule(pick);
                if engine::find_completion(&candidate, &[], &self.pattern).is_some() {
                    *protocol = candidate;
                    break;
                }
            }
        }
    }

    /// Generate `count` protocols named `<prefix><index>`.
    pub fn corpus(&mut self, prefix: &str, count: usize) -> RuntimeResult<Vec<Protocol>> {
        (0..count).map(|i| self.generate(format!("{}{}", prefix, i))).collect()
    }
}

/// A random turn pattern of length `bound`.
pub fn random_pattern(bound: usize, rng: &mut StdRng) -> Result<TurnPattern> {
    TurnPattern::new((0..bound).map(|_| AGENTS[rng.gen_range(0..2)]).collect())
}

/// Write each protocol to `<dir>/<name>.json`, creating `dir` if needed.
pub fn save_corpus(dir: &Path, protocols: &[Protocol]) -> RuntimeResult<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(protocols.len());
    for protocol in protocols {
        let path = dir.join(format!("{}.json", protocol.name()));
        protocol.save(&path)?;
        written.push(path);
    }
    info!(dir = %dir.display(), count = written.len(), "Saved corpus");
    Ok(written)
}

/// Load every `.json` protocol in `dir`, ordered by file name.
pub fn load_corpus(dir: &Path) -> RuntimeResult<Vec<Protocol>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map_or(false, |ext| ext == "json"))
        .collect();
    paths.sort();
    let protocols = paths
        .iter()
        .map(|p| Protocol::load(p))
        .collect::<Result<Vec<_>>>()?;
    info!(dir = %dir.display(), count = protocols.len(), "Loaded corpus");
    Ok(protocols)
}
