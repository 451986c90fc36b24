//! Utterance heuristics.

use crate::policy::{Turn, UtterancePolicy};
use parley_core::engine;
use parley_core::types::Symbol;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Own vocabulary in random order.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainUtterance;

impl UtterancePolicy for PlainUtterance {
    fn name(&self) -> &'static str {
        "plain"
    }

    fn candidates(&self, turn: &Turn<'_>, rng: &mut StdRng) -> Vec<Symbol> {
        let mut order = turn.vocabulary.to_vec();
        order.shuffle(rng);
        order
    }
}

/// Prefers symbols whose utterance constrains what the interlocutor may
/// answer, so the reply carries the most information.
///
/// Order: informative premises not yet said, then the rest, then (when
/// `defer_constraining` is set) symbols that are required predecessors of
/// positive `before`/`premise` rules.
#[derive(Debug, Clone, Copy)]
pub struct StudentUtterance {
    pub defer_constraining: bool,
}

impl Default for StudentUtterance {
    fn default() -> Self {
        Self {
            defer_constraining: true,
        }
    }
}

impl UtterancePolicy for StudentUtterance {
    fn name(&self) -> &'static str {
        "student"
    }

    fn candidates(&self, turn: &Turn<'_>, rng: &mut StdRng) -> Vec<Symbol> {
        let (me, you) = (turn.me, turn.interlocutor());
        let mut premises = Vec::new();
        let mut rest = Vec::new();
        let mut constraining = Vec::new();
        for s in turn.vocabulary {
            if turn.protocol.informative_premise(s, me, you) && !engine::said(s, me, turn.history) {
                premises.push(s.clone());
            } else if self.defer_constraining && turn.protocol.constraining_premise(s, me) {
                constraining.push(s.clone());
            } else {
                rest.push(s.clone());
            }
        }
        premises.shuffle(rng);
        rest.shuffle(rng);
        constraining.shuffle(rng);
        premises.extend(rest);
        premises.extend(constraining);
        premises
    }
}

/// Says first what pins down the reading of its own later symbols.
///
/// Order: self-premises not yet said, then the rest.
#[derive(Debug, Clone, Copy, Default)]
pub struct CooperativeUtterance;

impl UtterancePolicy for CooperativeUtterance {
    fn name(&self) -> &'static str {
        "cooperative"
    }

    fn candidates(&self, turn: &Turn<'_>, rng: &mut StdRng) -> Vec<Symbol> {
        let (mut first, mut rest): (Vec<Symbol>, Vec<Symbol>) =
            turn.vocabulary.iter().cloned().partition(|s| {
                turn.protocol.self_premise(s, turn.me) && !engine::said(s, turn.me, turn.history)
            });
        first.shuffle(rng);
        rest.shuffle(rng);
        first.extend(rest);
        first
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::prelude::*;
    use rand::SeedableRng;

    fn protocol() -> Protocol {
        let (a0, a1) = (AgentId::FIRST, AgentId::SECOND);
        Protocol::new(
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            vec![
                Rule::relation("a", "b", RelationKind::Response, false, a0, a1),
                Rule::relation("c", "d", RelationKind::Before, true, a0, a1),
                Rule::relation("d", "b", RelationKind::Premise, false, a0, a0),
            ],
            "utter",
        )
    }

    fn turn<'a>(p: &'a Protocol, history: &'a [Event]) -> Turn<'a> {
        Turn {
            protocol: p,
            history,
            me: AgentId::FIRST,
            vocabulary: p.vocabulary(),
        }
    }

    #[test]
    fn plain_is_a_permutation() {
        let p = protocol();
        let mut rng = StdRng::seed_from_u64(5);
        let mut order = PlainUtterance.candidates(&turn(&p, &[]), &mut rng);
        order.sort();
        assert_eq!(order, p.vocabulary().to_vec());
    }

    #[test]
    fn student_puts_premises_first_and_constraints_last() {
        let p = protocol();
        let mut rng = StdRng::seed_from_u64(5);
        let order = StudentUtterance::default().candidates(&turn(&p, &[]), &mut rng);
        assert_eq!(order[0], Symbol::from("a"));
        assert_eq!(order[3], Symbol::from("c"));
    }

    #[test]
    fn student_demotes_premises_already_said() {
        let p = protocol();
        let history = vec![Event::new(AgentId::FIRST, "a")];
        let mut rng = StdRng::seed_from_u64(5);
        let order = StudentUtterance { defer_constraining: false }
            .candidates(&turn(&p, &history), &mut rng);
        assert_eq!(order.len(), 4);
        assert!(order.contains(&Symbol::from("a")));
    }

    #[test]
    fn cooperative_leads_with_self_premises() {
        let p = protocol();
        let mut rng = StdRng::seed_from_u64(9);
        let order = CooperativeUtterance.candidates(&turn(&p, &[]), &mut rng);
        assert_eq!(order[0], Symbol::from("d"));
    }
}
