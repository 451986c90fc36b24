//! Handlers for monotonic rules.
//!
//! The legality check tolerates violated monotonic rules, so nothing in the
//! interpretation skeleton learns from them. These handlers close that gap.

use crate::policy::{Beliefs, MonotonicHandler, Turn};
use parley_core::engine;
use parley_core::types::Symbol;
use tracing::trace;

/// Ignores monotonic rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMonotonic;

impl MonotonicHandler for NoMonotonic {
    fn name(&self) -> &'static str {
        "none"
    }
}

/// Rewards a reading that newly satisfies a monotonic rule mentioning it.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicReward {
    pub amount: f64,
}

impl MonotonicHandler for MonotonicReward {
    fn name(&self) -> &'static str {
        "reward"
    }

    fn on_interpreted(&mut self, turn: &Turn<'_>, received: &Symbol, interpretation: &Symbol, beliefs: &mut Beliefs) {
        let event = turn.heard(interpretation);
        let mut extended = turn.history.to_vec();
        extended.push(event);

        let newly_met = turn
            .protocol
            .rules_mentioning(turn.interlocutor(), interpretation)
            .filter(|r| r.is_monotonic())
            .any(|r| !r.satisfied(turn.history) && r.satisfied(&extended));
        if newly_met {
            trace!(%received, %interpretation, "Monotonic rule met");
            beliefs.alignment.boost(received, interpretation, self.amount);
        }
    }
}

/// Penalises, at the end of a completed interaction, every commitment
/// behind a monotonic rule that is still violated.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicPenalty {
    pub fraction: f64,
}

impl MonotonicHandler for MonotonicPenalty {
    fn name(&self) -> &'static str {
        "penalty"
    }

    fn on_complete(&mut self, turn: &Turn<'_>, beliefs: &mut Beliefs) {
        let interloc = turn.interlocutor();
        let mut implicated = Vec::new();
        for rule in engine::monotonic_violations(turn.protocol, turn.history) {
            for native in rule.symbols_spoken_by(interloc) {
                if let Some(foreign) = beliefs.mappings.foreign_for(native) {
                    implicated.push((foreign.clone(), native.clone()));
                }
            }
        }
        implicated.sort();
        implicated.dedup();
        for (foreign, native) in &implicated {
            beliefs.alignment.discount(foreign, native, self.fraction);
        }
        if !implicated.is_empty() {
            beliefs.alignment.normalize_all();
        }
    }
}
