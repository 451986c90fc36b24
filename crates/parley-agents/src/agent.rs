//! The agent: one identity and vocabulary composed with three strategies.
//!
//! ```rust
//! use parley_agents::prelude::*;
//!
//! let agent = AgentBuilder::new(AgentId::FIRST, vec!["a".into(), "b".into()])
//!     .kind(AgentKind::Reasoner)
//!     .seed(7)
//!     .build()
//!     .unwrap();
//! assert_eq!(agent.label(), "plain/causal/none");
//! ```

use crate::alignment::{Alignment, MappingsMade};
use crate::config::LearningConfig;
use crate::interpretation::{WeightedInterpreter, WorldEliminator};
use crate::monotonic::{MonotonicPenalty, MonotonicReward, NoMonotonic};
use crate::policy::{Beliefs, InterpretationPolicy, MonotonicHandler, Turn, UtterancePolicy};
use crate::utterance::{CooperativeUtterance, PlainUtterance, StudentUtterance};
use crate::worlds::{PossibleWorlds, MAX_WORLD_VOCABULARY};
use parley_core::engine;
use parley_core::error::{ParleyError, Result};
use parley_core::protocol::Protocol;
use parley_core::types::{AgentId, Event, Outcome, Symbol, SymbolMap};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Preset strategy combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentKind {
    /// Plain utterances, frequency learning.
    Simple,
    /// Simple plus monotonic rewards.
    SimpleMon,
    /// Student utterances, frequency learning.
    Student,
    /// Student utterances without deferring constraints, plus monotonic rewards.
    StudentMon,
    /// Cooperative utterances, frequency learning, monotonic penalties.
    Cooperative,
    /// Plain utterances, causal reinforcement.
    Reasoner,
    /// Plain utterances, possible-world elimination.
    Logical,
}

impl AgentKind {
    pub const ALL: [AgentKind; 7] = [
        AgentKind::Simple,
        AgentKind::SimpleMon,
        AgentKind::Student,
        AgentKind::StudentMon,
        AgentKind::Cooperative,
        AgentKind::Reasoner,
        AgentKind::Logical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Simple => "simple",
            AgentKind::SimpleMon => "simple-mon",
            AgentKind::Student => "student",
            AgentKind::StudentMon => "student-mon",
            AgentKind::Cooperative => "cooperative",
            AgentKind::Reasoner => "reasoner",
            AgentKind::Logical => "logical",
        }
    }

    fn utterance(self) -> Box<dyn UtterancePolicy> {
        match self {
            AgentKind::Student => Box::new(StudentUtterance { defer_constraining: true }),
            AgentKind::StudentMon => Box::new(StudentUtterance { defer_constraining: false }),
            AgentKind::Cooperative => Box::new(CooperativeUtterance),
            _ => Box::new(PlainUtterance),
        }
    }

    fn interpretation(self, vocabulary: &[Symbol], config: &LearningConfig) -> Box<dyn InterpretationPolicy> {
        match self {
            AgentKind::Reasoner => Box::new(WeightedInterpreter::causal(config.clone())),
            AgentKind::Logical => Box::new(WorldEliminator::new(vocabulary.to_vec())),
            _ => Box::new(WeightedInterpreter::frequency(config.clone())),
        }
    }

    fn monotonic(self, config: &LearningConfig) -> Box<dyn MonotonicHandler> {
        match self {
            AgentKind::SimpleMon | AgentKind::StudentMon => Box::new(MonotonicReward {
                amount: config.monotonic_reward,
            }),
            AgentKind::Cooperative => Box::new(MonotonicPenalty {
                fraction: config.monotonic_penalty,
            }),
            _ => Box::new(NoMonotonic),
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentKind {
    type Err = ParleyError;

    fn from_str(s: &str) -> Result<Self> {
        AgentKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ParleyError::invalid_config("agent", s, "unknown agent kind"))
    }
}

/// One interlocutor: identity, vocabulary, strategies and beliefs.
pub struct Agent {
    id: AgentId,
    vocabulary: Vec<Symbol>,
    utterance: Box<dyn UtterancePolicy>,
    interpretation: Box<dyn InterpretationPolicy>,
    monotonic: Box<dyn MonotonicHandler>,
    beliefs: Beliefs,
    outcomes: Vec<Outcome>,
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("strategies", &self.label())
            .field("vocabulary", &self.vocabulary)
            .field("outcomes", &self.outcomes.len())
            .finish()
    }
}

impl Agent {
    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn vocabulary(&self) -> &[Symbol] {
        &self.vocabulary
    }

    /// `utterance/interpretation/monotonic` strategy names.
    pub fn label(&self) -> String {
        format!(
            "{}/{}/{}",
            self.utterance.name(),
            self.interpretation.name(),
            self.monotonic.name()
        )
    }

    fn turn<'a>(&'a self, protocol: &'a Protocol, history: &'a [Event]) -> Turn<'a> {
        Turn {
            protocol,
            history,
            me: self.id,
            vocabulary: &self.vocabulary,
        }
    }

    /// Reset the per-interaction working map.
    pub fn begin_interaction(&mut self) {
        self.beliefs.mappings.clear();
        self.interpretation.begin(&mut self.beliefs);
    }

    /// The first legal symbol in the utterance policy's order, or `None`
    /// when no own symbol may be said now.
    pub fn speak(&mut self, protocol: &Protocol, history: &[Event]) -> Option<Symbol> {
        let turn = Turn {
            protocol,
            history,
            me: self.id,
            vocabulary: &self.vocabulary,
        };
        let candidates = self.utterance.candidates(&turn, &mut self.beliefs.rng);
        let choice = candidates
            .into_iter()
            .find(|s| self.may_say(protocol, history, s));
        debug!(agent = %self.id, utterance = ?choice, "Speaking");
        choice
    }

    /// Read `received` in the agent's own vocabulary. `history` is the
    /// local history before the new event.
    pub fn hear(&mut self, protocol: &Protocol, history: &[Event], received: &Symbol) -> Option<Symbol> {
        let turn = Turn {
            protocol,
            history,
            me: self.id,
            vocabulary: &self.vocabulary,
        };
        let interpretation = self.interpretation.interpret(&turn, received, &mut self.beliefs)?;
        self.monotonic
            .on_interpreted(&turn, received, &interpretation, &mut self.beliefs);
        self.beliefs.alignment.normalize_all();
        Some(interpretation)
    }

    /// Close the interaction and record its outcome.
    pub fn finish(&mut self, protocol: &Protocol, history: &[Event], completed: bool) -> Outcome {
        let turn = Turn {
            protocol,
            history,
            me: self.id,
            vocabulary: &self.vocabulary,
        };
        if completed {
            self.monotonic.on_complete(&turn, &mut self.beliefs);
        }
        let outcome = self.interpretation.finish(&turn, completed, &mut self.beliefs);
        self.outcomes.push(outcome);
        outcome
    }

    /// Current confidence table. For logical agents, the reading of a
    /// representative surviving world.
    pub fn alignment(&self) -> &Alignment {
        &self.beliefs.alignment
    }

    pub fn possible_worlds(&self) -> Option<&PossibleWorlds> {
        self.interpretation.possible_worlds()
    }

    pub fn mappings(&self) -> &MappingsMade {
        &self.beliefs.mappings
    }

    /// Outcomes of every interaction so far, oldest first.
    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    /// Whether `symbol` would be a legal utterance for this agent now.
    pub fn may_say(&self, protocol: &Protocol, history: &[Event], symbol: &Symbol) -> bool {
        let turn = self.turn(protocol, history);
        engine::is_legal(protocol, history, &turn.uttered(symbol))
    }
}

/// Builder for [`Agent`]s from a preset or custom strategies.
pub struct AgentBuilder {
    id: AgentId,
    vocabulary: Vec<Symbol>,
    kind: AgentKind,
    config: LearningConfig,
    prior: Option<SymbolMap>,
    seed: Option<u64>,
    utterance: Option<Box<dyn UtterancePolicy>>,
    interpretation: Option<Box<dyn InterpretationPolicy>>,
    monotonic: Option<Box<dyn MonotonicHandler>>,
}

impl AgentBuilder {
    pub fn new(id: AgentId, vocabulary: Vec<Symbol>) -> Self {
        Self {
            id,
            vocabulary,
            kind: AgentKind::Simple,
            config: LearningConfig::default(),
            prior: None,
            seed: None,
            utterance: None,
            interpretation: None,
            monotonic: None,
        }
    }

    pub fn kind(mut self, kind: AgentKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn config(mut self, config: LearningConfig) -> Self {
        self.config = config;
        self
    }

    /// Seed the alignment with a prior foreign-to-native mapping.
    pub fn prior(mut self, prior: SymbolMap) -> Self {
        self.prior = Some(prior);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn utterance(mut self, policy: Box<dyn UtterancePolicy>) -> Self {
        self.utterance = Some(policy);
        self
    }

    pub fn interpretation(mut self, policy: Box<dyn InterpretationPolicy>) -> Self {
        self.interpretation = Some(policy);
        self
    }

    pub fn monotonic(mut self, handler: Box<dyn MonotonicHandler>) -> Self {
        self.monotonic = Some(handler);
        self
    }

    pub fn build(self) -> Result<Agent> {
        self.config.validate()?;
        if self.vocabulary.is_empty() {
            return Err(ParleyError::invalid_config("vocabulary", "[]", "must not be empty"));
        }
        if self.kind == AgentKind::Logical
            && self.interpretation.is_none()
            && self.vocabulary.len() > MAX_WORLD_VOCABULARY
        {
            return Err(ParleyError::invalid_config(
                "vocabulary",
                self.vocabulary.len().to_string(),
                format!("logical agents support at most {} symbols", MAX_WORLD_VOCABULARY),
            ));
        }

        let alignment = match self.prior {
            Some(prior) => Alignment::with_prior(self.vocabulary.clone(), prior, self.config.prior_boost),
            None => Alignment::new(self.vocabulary.clone()),
        };
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let utterance = self.utterance.unwrap_or_else(|| self.kind.utterance());
        let interpretation = match self.interpretation {
            Some(policy) => policy,
            None => self.kind.interpretation(&self.vocabulary, &self.config),
        };
        let monotonic = match self.monotonic {
            Some(handler) => handler,
            None => self.kind.monotonic(&self.config),
        };

        Ok(Agent {
            id: self.id,
            vocabulary: self.vocabulary,
            utterance,
            interpretation,
            monotonic,
            beliefs: Beliefs {
                alignment,
                mappings: MappingsMade::new(),
                rng,
            },
            outcomes: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::rule::{RelationKind, Rule};

    fn vocab() -> Vec<Symbol> {
        vec!["x".into(), "y".into()]
    }

    #[test]
    fn kinds_round_trip_through_strings() {
        for kind in AgentKind::ALL {
            assert_eq!(kind.as_str().parse::<AgentKind>().unwrap(), kind);
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind));
        }
        assert!("oracle".parse::<AgentKind>().is_err());
    }

    #[test]
    fn presets_pick_expected_strategies() {
        let label = |kind| {
            AgentBuilder::new(AgentId::FIRST, vocab())
                .kind(kind)
                .seed(1)
                .build()
                .unwrap()
                .label()
        };
        assert_eq!(label(AgentKind::Simple), "plain/frequency/none");
        assert_eq!(label(AgentKind::StudentMon), "student/frequency/reward");
        assert_eq!(label(AgentKind::Cooperative), "cooperative/frequency/penalty");
        assert_eq!(label(AgentKind::Logical), "plain/possible-worlds/none");
    }

    #[test]
    fn builder_rejects_empty_vocabulary_and_bad_config() {
        assert!(AgentBuilder::new(AgentId::FIRST, vec![]).build().is_err());
        let config = LearningConfig {
            punish_rate: -1.0,
            ..Default::default()
        };
        assert!(AgentBuilder::new(AgentId::FIRST, vocab()).config(config).build().is_err());
    }

    #[test]
    fn logical_agents_cap_vocabulary() {
        let big: Vec<Symbol> = (0..=MAX_WORLD_VOCABULARY).map(|i| Symbol::new(format!("s{}", i))).collect();
        assert!(AgentBuilder::new(AgentId::FIRST, big).kind(AgentKind::Logical).build().is_err());
    }

    #[test]
    fn speak_returns_only_legal_symbols() {
        let p = Protocol::new(
            vocab(),
            vec![Rule::relation("y", "x", RelationKind::Before, true, AgentId::FIRST, AgentId::FIRST)],
            "speak",
        );
        let mut agent = AgentBuilder::new(AgentId::FIRST, vocab()).seed(3).build().unwrap();
        for _ in 0..10 {
            assert_eq!(agent.speak(&p, &[]), Some(Symbol::from("y")));
        }
        assert!(!agent.may_say(&p, &[], &"x".into()));
    }

    #[test]
    fn finish_records_outcomes() {
        let p = Protocol::new(vocab(), vec![], "done");
        let mut agent = AgentBuilder::new(AgentId::SECOND, vocab()).seed(3).build().unwrap();
        agent.begin_interaction();
        assert!(agent.hear(&p, &[], &"q".into()).is_some());
        assert_eq!(agent.mappings().len(), 1);
        assert_eq!(agent.finish(&p, &[], true), Outcome::Completed);
        assert_eq!(agent.finish(&p, &[], false), Outcome::Failed);
        assert_eq!(agent.outcomes(), &[Outcome::Completed, Outcome::Failed]);
    }
}
