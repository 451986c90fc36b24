//! Constraint engine: direct rule evaluation over interaction histories.
//!
//! Every query re-evaluates the protocol from scratch against the history it
//! is given; there is no incremental state to keep in sync.
//!
//! Two notions of "broken" are used:
//!
//! - **violations**: rules not satisfied by the history taken as complete.
//! - **blocking violations**: non-monotonic rules that the prefix already
//!   breaks. Monotonic rules may still be satisfied by later events, and a
//!   positive `immAfter` whose trigger is the last event is merely pending.
//!
//! A turn is legal iff appending it produces no blocking violation.

use crate::protocol::Protocol;
use crate::rule::Rule;
use crate::types::{AgentId, Event, Symbol, TurnPattern};

/// Upper bound on search nodes visited by [`find_completion`].
pub const COMPLETION_BUDGET: usize = 200_000;

/// Rules of `protocol` not satisfied by `history`.
pub fn violations<'p>(protocol: &'p Protocol, history: &[Event]) -> Vec<&'p Rule> {
    protocol
        .rules()
        .iter()
        .filter(|r| !r.satisfied(history))
        .collect()
}

/// Violated monotonic rules (tolerated mid-interaction).
pub fn monotonic_violations<'p>(protocol: &'p Protocol, history: &[Event]) -> Vec<&'p Rule> {
    protocol
        .rules()
        .iter()
        .filter(|r| r.is_monotonic() && !r.satisfied(history))
        .collect()
}

/// Non-monotonic rules broken by the prefix itself.
pub fn blocking_violations<'p>(protocol: &'p Protocol, history: &[Event]) -> Vec<&'p Rule> {
    protocol
        .rules()
        .iter()
        .filter(|r| !r.is_monotonic() && r.violated_on_prefix(history))
        .collect()
}

/// Blocking violations produced by appending `candidate` to `history`.
pub fn blocking_after<'p>(
    protocol: &'p Protocol,
    history: &[Event],
    candidate: &Event,
) -> Vec<&'p Rule> {
    let extended = extend(history, candidate);
    blocking_violations(protocol, &extended)
}

pub fn is_satisfied(protocol: &Protocol, history: &[Event]) -> bool {
    protocol.rules().iter().all(|r| r.satisfied(history))
}

/// Whether `candidate` may be appended to `history`.
pub fn is_legal(protocol: &Protocol, history: &[Event], candidate: &Event) -> bool {
    let extended = extend(history, candidate);
    !protocol
        .rules()
        .iter()
        .any(|r| !r.is_monotonic() && r.violated_on_prefix(&extended))
}

/// Whether `agent` has uttered `symbol` anywhere in `history`.
pub fn said(symbol: &Symbol, agent: AgentId, history: &[Event]) -> bool {
    history.iter().any(|e| e.is(agent, symbol))
}

/// Search for a complete history that follows `pattern`, extends `prefix`
/// and satisfies every rule of `protocol`.
///
/// Depth-first over the protocol vocabulary, pruning any branch with a
/// blocking violation. Returns `None` when no completion exists, when the
/// prefix disagrees with the pattern, or when [`COMPLETION_BUDGET`] nodes
/// have been visited without success.
pub fn find_completion(
    protocol: &Protocol,
    prefix: &[Event],
    pattern: &TurnPattern,
) -> Option<Vec<Event>> {
    if prefix.len() > pattern.len()
        || prefix.iter().zip(pattern.iter()).any(|(e, ag)| e.agent != ag)
        || !blocking_violations(protocol, prefix).is_empty()
    {
        return None;
    }
    let mut history = prefix.to_vec();
    let mut budget = COMPLETION_BUDGET;
    if search(protocol, pattern.turns(), &mut history, &mut budget) {
        Some(history)
    } else {
        None
    }
}

fn search(protocol: &Protocol, turns: &[AgentId], history: &mut Vec<Event>, budget: &mut usize) -> bool {
    if history.len() == turns.len() {
        return is_satisfied(protocol, history);
    }
    let speaker = turns[history.len()];
    for symbol in protocol.vocabulary() {
        if *budget == 0 {
            return false;
        }
        *budget -= 1;
        history.push(Event::new(speaker, symbol.clone()));
        if blocking_violations(protocol, history).is_empty()
            && search(protocol, turns, history, budget)
        {
            return true;
        }
        history.pop();
    }
    false
}

fn extend(history: &[Event], candidate: &Event) -> Vec<Event> {
    let mut extended = Vec::with_capacity(history.len() + 1);
    extended.extend_from_slice(history);
    extended.push(candidate.clone());
    extended
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::RelationKind;

    const A0: AgentId = AgentId::FIRST;
    const A1: AgentId = AgentId::SECOND;

    fn protocol(rules: Vec<Rule>) -> Protocol {
        Protocol::new(vec!["a".into(), "b".into(), "c".into()], rules, "engine")
    }

    #[test]
    fn violations_lists_unsatisfied_rules() {
        let p = protocol(vec![
            Rule::existential("a", A0, true),
            Rule::relation("a", "b", RelationKind::Before, true, A0, A1),
        ]);
        let h = vec![Event::new(A1, "b"), Event::new(A0, "a")];
        let v = violations(&p, &h);
        assert_eq!(v, vec![&p.rules()[1]]);
        assert!(monotonic_violations(&p, &h).is_empty());
        assert_eq!(blocking_violations(&p, &h).len(), 1);
        assert!(!is_satisfied(&p, &h));
    }

    #[test]
    fn monotonic_violations_do_not_block() {
        let p = protocol(vec![
            Rule::existential("c", A1, true),
            Rule::relation("a", "b", RelationKind::Response, true, A0, A1),
        ]);
        let h = vec![];
        assert!(is_legal(&p, &h, &Event::new(A0, "a")));
        let h = vec![Event::new(A0, "a")];
        assert_eq!(monotonic_violations(&p, &h).len(), 2);
        assert!(blocking_violations(&p, &h).is_empty());
    }

    #[test]
    fn before_blocks_early_consequence() {
        let p = protocol(vec![Rule::relation("a", "b", RelationKind::Before, true, A0, A1)]);
        assert!(!is_legal(&p, &[], &Event::new(A1, "b")));
        assert!(is_legal(&p, &[Event::new(A0, "a")], &Event::new(A1, "b")));
    }

    #[test]
    fn pending_immediately_after_does_not_block() {
        let p = protocol(vec![Rule::relation(
            "a",
            "b",
            RelationKind::ImmediatelyAfter,
            true,
            A0,
            A1,
        )]);
        assert!(is_legal(&p, &[], &Event::new(A0, "a")));
        let h = vec![Event::new(A0, "a")];
        assert!(!is_legal(&p, &h, &Event::new(A1, "c")));
        assert!(is_legal(&p, &h, &Event::new(A1, "b")));
        // complete evaluation still reports the open obligation
        assert_eq!(violations(&p, &h).len(), 1);
    }

    #[test]
    fn negative_existential_blocks() {
        let p = protocol(vec![Rule::existential("a", A1, false)]);
        assert!(!is_legal(&p, &[], &Event::new(A1, "a")));
        assert!(is_legal(&p, &[], &Event::new(A0, "a")));
        assert_eq!(blocking_after(&p, &[], &Event::new(A1, "a")).len(), 1);
    }

    #[test]
    fn said_checks_speaker() {
        let h = vec![Event::new(A0, "a")];
        assert!(said(&"a".into(), A0, &h));
        assert!(!said(&"a".into(), A1, &h));
    }

    #[test]
    fn find_completion_satisfies_everything() {
        let p = protocol(vec![
            Rule::existential("c", A1, true),
            Rule::relation("a", "c", RelationKind::Premise, true, A0, A1),
        ]);
        let pattern = TurnPattern::alternating(4).unwrap();
        let found = find_completion(&p, &[], &pattern).unwrap();
        assert_eq!(found.len(), 4);
        assert!(is_satisfied(&p, &found));
        for (e, ag) in found.iter().zip(pattern.iter()) {
            assert_eq!(e.agent, ag);
        }
    }

    #[test]
    fn find_completion_detects_contradiction() {
        let p = protocol(vec![
            Rule::existential("a", A0, true),
            Rule::existential("a", A0, false),
        ]);
        let pattern = TurnPattern::alternating(2).unwrap();
        assert!(find_completion(&p, &[], &pattern).is_none());
    }

    #[test]
    fn find_completion_rejects_mismatched_prefix() {
        let p = protocol(vec![]);
        let pattern = TurnPattern::alternating(2).unwrap();
        assert!(find_completion(&p, &[Event::new(A1, "a")], &pattern).is_none());
        assert!(find_completion(&p, &[Event::new(A0, "a")], &pattern).is_some());
    }
}
