//! Interpretation strategies.
//!
//! Both strategies share one skeleton: examine native candidates for the
//! received symbol, commit the first legal one that no other foreign symbol
//! has claimed this interaction, and learn from every illegal candidate.
//! They differ in what "learn" means:
//!
//! - [`WeightedInterpreter`] reweights confidence scores, either punishing
//!   the candidate directly (frequency learning) or tracing the broken rule
//!   back to an earlier commitment (causal reinforcement).
//! - [`WorldEliminator`] removes every possible world the failure refutes.

use crate::config::LearningConfig;
use crate::policy::{Beliefs, InterpretationPolicy, Turn};
use crate::worlds::{PossibleWorlds, Refutation};
use parley_core::engine;
use parley_core::rule::{RelationKind, Rule};
use parley_core::types::{Outcome, Symbol};
use rand::seq::SliceRandom;
use std::collections::BTreeSet;
use tracing::{debug, trace};

/// How an illegal candidate feeds back into the scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reinforcement {
    /// `score -= punish_rate * score` on the candidate.
    Frequency,
    /// Trace the broken rule to the commitment that caused it.
    Causal,
}

/// Confidence-weighted interpretation.
#[derive(Debug, Clone)]
pub struct WeightedInterpreter {
    reinforcement: Reinforcement,
    config: LearningConfig,
}

impl WeightedInterpreter {
    pub fn new(reinforcement: Reinforcement, config: LearningConfig) -> Self {
        Self {
            reinforcement,
            config,
        }
    }

    pub fn frequency(config: LearningConfig) -> Self {
        Self::new(Reinforcement::Frequency, config)
    }

    pub fn causal(config: LearningConfig) -> Self {
        Self::new(Reinforcement::Causal, config)
    }

    /// Fraction added to every legal candidate's score.
    fn reward_rate(&self) -> f64 {
        match self.reinforcement {
            Reinforcement::Frequency => self.config.reward_rate,
            Reinforcement::Causal => self.config.reasoner_reward_rate,
        }
    }

    /// Causal feedback for an illegal `candidate` that broke `broken`.
    fn trace_cause(
        &self,
        turn: &Turn<'_>,
        received: &Symbol,
        candidate: &Symbol,
        broken: &[&Rule],
        beliefs: &mut Beliefs,
    ) {
        let interloc = turn.interlocutor();

        let forbidden = broken.iter().any(|r| {
            matches!(r, Rule::Existential(e) if !e.positive && e.agent == interloc && &e.symbol == candidate)
        });
        if forbidden {
            beliefs.alignment.set(received, candidate, 0.0);
            return;
        }

        let mut culprits = BTreeSet::new();
        for rule in broken {
            let traceable = matches!(
                rule.kind(),
                Some(
                    RelationKind::Correlation
                        | RelationKind::Response
                        | RelationKind::Premise
                        | RelationKind::ImmediatelyAfter
                )
            );
            if !traceable {
                continue;
            }
            let Some((side, other)) = rule.counterpart(interloc, candidate) else {
                continue;
            };
            if side != interloc {
                continue;
            }
            if let Some(foreign) = beliefs.mappings.foreign_for(other) {
                if foreign != received {
                    culprits.insert((foreign.clone(), other.clone()));
                }
            }
        }

        if culprits.is_empty() {
            beliefs
                .alignment
                .discount(received, candidate, self.config.reasoner_decay);
            return;
        }
        for (foreign, native) in culprits {
            let score = beliefs.alignment.score(&foreign, &native);
            let fraction = (self.config.causal_factor * score).min(self.config.causal_cap);
            trace!(%foreign, %native, fraction, "Discounting traced commitment");
            beliefs.alignment.discount(&foreign, &native, fraction);
        }
    }
}

impl InterpretationPolicy for WeightedInterpreter {
    fn name(&self) -> &'static str {
        match self.reinforcement {
            Reinforcement::Frequency => "frequency",
            Reinforcement::Causal => "causal",
        }
    }

    fn interpret(&mut self, turn: &Turn<'_>, received: &Symbol, beliefs: &mut Beliefs) -> Option<Symbol> {
        beliefs.alignment.ensure(received);
        let ranked = beliefs.alignment.ranked(received, &mut beliefs.rng);

        let mut chosen = beliefs
            .mappings
            .get(received)
            .filter(|prev| engine::is_legal(turn.protocol, turn.history, &turn.heard(prev)))
            .cloned();

        for candidate in &ranked {
            let broken = engine::blocking_after(turn.protocol, turn.history, &turn.heard(candidate));
            if broken.is_empty() {
                if chosen.is_none() && !beliefs.mappings.claimed_by_other(candidate, received) {
                    chosen = Some(candidate.clone());
                }
                let score = beliefs.alignment.score(received, candidate);
                beliefs
                    .alignment
                    .boost(received, candidate, self.reward_rate() * score);
            } else {
                match self.reinforcement {
                    Reinforcement::Frequency => {
                        beliefs
                            .alignment
                            .discount(received, candidate, self.config.punish_rate);
                    }
                    Reinforcement::Causal => {
                        self.trace_cause(turn, received, candidate, &broken, beliefs);
                    }
                }
            }
        }

        beliefs.alignment.normalize_all();
        if let Some(native) = &chosen {
            beliefs.mappings.commit(received.clone(), native.clone());
        }
        debug!(%received, interpretation = ?chosen, "Interpreted");
        chosen
    }
}

/// Possible-world elimination. Never learns scores; its alignment is the
/// reading of a representative surviving world.
#[derive(Debug, Clone)]
pub struct WorldEliminator {
    worlds: PossibleWorlds,
}

impl WorldEliminator {
    pub fn new(vocabulary: Vec<Symbol>) -> Self {
        Self {
            worlds: PossibleWorlds::new(vocabulary),
        }
    }

    /// Build the refutation for reading slot `foreign` as native `native`
    /// when that broke `rule`.
    ///
    /// The refuted worlds are exactly those under which the history the
    /// agent evaluated is indistinguishable from the real one as far as
    /// `rule` is concerned: they pin every committed interlocutor-side
    /// symbol of the rule to its committed foreign symbol and read no other
    /// foreign symbol of this interaction as one of the rule's remaining
    /// interlocutor-side symbols.
    fn refutation(&self, turn: &Turn<'_>, foreign: usize, native: usize, rule: &Rule, beliefs: &Beliefs) -> Option<Refutation> {
        let interloc = turn.interlocutor();
        let rule_natives: BTreeSet<usize> = rule
            .symbols_spoken_by(interloc)
            .into_iter()
            .filter_map(|s| self.worlds.native_index(s))
            .collect();

        let mut pinned = Vec::new();
        let mut avoid = Vec::new();
        for (g, n) in beliefs.mappings.iter() {
            let slot = self.worlds.slot(g)?;
            if slot == foreign {
                continue;
            }
            let n_idx = self.worlds.native_index(n)?;
            if rule_natives.contains(&n_idx) {
                pinned.push((slot, n_idx));
            } else {
                avoid.push(slot);
            }
        }
        let committed: BTreeSet<usize> = pinned.iter().map(|&(_, n)| n).collect();
        let reserved = rule_natives
            .iter()
            .copied()
            .filter(|n| !committed.contains(n))
            .collect();
        Some(Refutation {
            foreign,
            native,
            pinned,
            avoid,
            reserved,
        })
    }
}

impl InterpretationPolicy for WorldEliminator {
    fn name(&self) -> &'static str {
        "possible-worlds"
    }

    fn begin(&mut self, beliefs: &mut Beliefs) {
        if let Some(world) = self.worlds.representative(&mut beliefs.rng) {
            beliefs.alignment = self.worlds.alignment_of(&world);
        }
    }

    fn interpret(&mut self, turn: &Turn<'_>, received: &Symbol, beliefs: &mut Beliefs) -> Option<Symbol> {
        let Some(slot) = self.worlds.learn(received) else {
            debug!(%received, "More foreign symbols than native ones");
            return None;
        };

        if let Some(prev) = beliefs.mappings.get(received) {
            return engine::is_legal(turn.protocol, turn.history, &turn.heard(prev)).then(|| prev.clone());
        }

        let mut order: Vec<usize> = (0..self.worlds.vocabulary().len()).collect();
        order.shuffle(&mut beliefs.rng);

        let mut chosen = None;
        for native in order {
            let candidate = self.worlds.vocabulary()[native].clone();
            if beliefs.mappings.claimed_by_other(&candidate, received) || !self.worlds.supports(slot, native) {
                continue;
            }
            let broken = engine::blocking_after(turn.protocol, turn.history, &turn.heard(&candidate));
            if broken.is_empty() {
                if chosen.is_none() {
                    chosen = Some(candidate);
                }
                continue;
            }
            for rule in broken {
                if let Some(refutation) = self.refutation(turn, slot, native, rule, beliefs) {
                    let removed = self.worlds.eliminate(&refutation);
                    trace!(%received, %candidate, %rule, removed, "Eliminated worlds");
                }
            }
        }

        if let Some(native) = &chosen {
            beliefs.mappings.commit(received.clone(), native.clone());
        }
        debug!(%received, interpretation = ?chosen, worlds = self.worlds.len(), "Interpreted");
        chosen
    }

    fn finish(&mut self, turn: &Turn<'_>, completed: bool, beliefs: &mut Beliefs) -> Outcome {
        if let Some(world) = self.worlds.representative(&mut beliefs.rng) {
            beliefs.alignment = self.worlds.alignment_of(&world);
        }
        if completed && engine::violations(turn.protocol, turn.history).is_empty() {
            Outcome::Verified
        } else {
            Outcome::Failed
        }
    }

    fn possible_worlds(&self) -> Option<&PossibleWorlds> {
        Some(&self.worlds)
    }
}
