//! Rule model: the two rule shapes and their satisfaction semantics.
//!
//! A rule is evaluated directly against a finite, append-only history of
//! [`Event`]s. `Existential` rules ask whether an utterance occurs at all;
//! `Relation` rules constrain the relative positions of two utterances.
//!
//! Positive existentials and positive `response`/`correlation` relations are
//! *monotonic*: the engine tolerates their violation mid-interaction because
//! later events may still satisfy them. Every other rule is decided by the
//! prefix already seen, except for a positive `immAfter` whose trigger is the
//! last event (a *pending* obligation).

use crate::error::{ParleyError, Result};
use crate::types::{AgentId, Event, Symbol, SymbolMap};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Temporal relation between two utterances A and B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RelationKind {
    /// A occurs iff B occurs (presence, not order).
    #[serde(rename = "correlation")]
    Correlation,
    /// Every A is eventually followed by B.
    #[serde(rename = "response")]
    Response,
    /// Every B is preceded by some A.
    #[serde(rename = "before")]
    Before,
    /// Every B is immediately preceded by A.
    #[serde(rename = "premise")]
    Premise,
    /// Every A is immediately followed by B.
    #[serde(rename = "immAfter")]
    ImmediatelyAfter,
}

impl RelationKind {
    pub const ALL: [RelationKind; 5] = [
        RelationKind::Correlation,
        RelationKind::Response,
        RelationKind::Before,
        RelationKind::Premise,
        RelationKind::ImmediatelyAfter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::Correlation => "correlation",
            RelationKind::Response => "response",
            RelationKind::Before => "before",
            RelationKind::Premise => "premise",
            RelationKind::ImmediatelyAfter => "immAfter",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationKind {
    type Err = ParleyError;

    fn from_str(s: &str) -> Result<Self> {
        RelationKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ParleyError::MalformedRule(format!("unknown relation type '{}'", s)))
    }
}

/// `agent` must (positive) or must never (negative) utter `symbol`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Existential {
    pub symbol: Symbol,
    pub agent: AgentId,
    pub positive: bool,
    /// Occurrence count carried by persisted records; not part of the semantics.
    pub count: u32,
}

impl Existential {
    pub fn satisfied(&self, history: &[Event]) -> bool {
        let occurs = history.iter().any(|e| e.is(self.agent, &self.symbol));
        occurs == self.positive
    }
}

/// A temporal constraint between A = (`agent_a`, `a`) and B = (`agent_b`, `b`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Relation {
    pub a: Symbol,
    pub b: Symbol,
    pub kind: RelationKind,
    pub positive: bool,
    pub agent_a: AgentId,
    pub agent_b: AgentId,
}

impl Relation {
    fn is_a(&self, e: &Event) -> bool {
        e.is(self.agent_a, &self.a)
    }

    fn is_b(&self, e: &Event) -> bool {
        e.is(self.agent_b, &self.b)
    }

    /// No occurrence of A is (strictly) followed by an occurrence of B.
    fn never_a_then_b(&self, h: &[Event]) -> bool {
        match h.iter().position(|e| self.is_a(e)) {
            None => true,
            Some(first_a) => !h[first_a + 1..].iter().any(|e| self.is_b(e)),
        }
    }

    /// No B sits right after an A.
    fn never_adjacent(&self, h: &[Event]) -> bool {
        !h.windows(2).any(|w| self.is_a(&w[0]) && self.is_b(&w[1]))
    }

    pub fn satisfied(&self, h: &[Event]) -> bool {
        match (self.kind, self.positive) {
            (RelationKind::Correlation, true) => {
                h.iter().any(|e| self.is_a(e)) == h.iter().any(|e| self.is_b(e))
            }
            (RelationKind::Correlation, false) => {
                !(h.iter().any(|e| self.is_a(e)) && h.iter().any(|e| self.is_b(e)))
            }
            (RelationKind::Response, true) => {
                let last_a = h.iter().rposition(|e| self.is_a(e));
                let last_b = h.iter().rposition(|e| self.is_b(e));
                match (last_a, last_b) {
                    (None, _) => true,
                    (Some(a), Some(b)) => a <= b,
                    (Some(_), None) => false,
                }
            }
            (RelationKind::Response, false) | (RelationKind::Before, false) => {
                self.never_a_then_b(h)
            }
            (RelationKind::Before, true) => match h.iter().position(|e| self.is_b(e)) {
                None => true,
                Some(first_b) => h[..first_b].iter().any(|e| self.is_a(e)),
            },
            (RelationKind::Premise, true) => h
                .iter()
                .enumerate()
                .filter(|(_, e)| self.is_b(e))
                .all(|(j, _)| j > 0 && self.is_a(&h[j - 1])),
            (RelationKind::ImmediatelyAfter, true) => h
                .iter()
                .enumerate()
                .filter(|(_, e)| self.is_a(e))
                .all(|(i, _)| i + 1 < h.len() && self.is_b(&h[i + 1])),
            (RelationKind::Premise, false) | (RelationKind::ImmediatelyAfter, false) => {
                self.never_adjacent(h)
            }
        }
    }

    /// A positive `immAfter` whose only unmet trigger is the last event.
    pub fn pending(&self, h: &[Event]) -> bool {
        if self.kind != RelationKind::ImmediatelyAfter || !self.positive {
            return false;
        }
        let Some(last) = h.last() else {
            return false;
        };
        self.is_a(last)
            && h[..h.len() - 1]
                .iter()
                .enumerate()
                .filter(|(_, e)| self.is_a(e))
                .all(|(i, _)| self.is_b(&h[i + 1]))
    }
}

/// A protocol rule: either an existential or a relational constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Rule {
    Existential(Existential),
    Relation(Relation),
}

impl Rule {
    pub fn existential(symbol: impl Into<Symbol>, agent: AgentId, positive: bool) -> Self {
        Rule::Existential(Existential {
            symbol: symbol.into(),
            agent,
            positive,
            count: u32::from(positive),
        })
    }

    pub fn relation(
        a: impl Into<Symbol>,
        b: impl Into<Symbol>,
        kind: RelationKind,
        positive: bool,
        agent_a: AgentId,
        agent_b: AgentId,
    ) -> Self {
        Rule::Relation(Relation {
            a: a.into(),
            b: b.into(),
            kind,
            positive,
            agent_a,
            agent_b,
        })
    }

    pub fn positive(&self) -> bool {
        match self {
            Rule::Existential(e) => e.positive,
            Rule::Relation(r) => r.positive,
        }
    }

    /// Once satisfied, stays satisfied under any append-only extension.
    pub fn is_monotonic(&self) -> bool {
        match self {
            Rule::Existential(e) => e.positive,
            Rule::Relation(r) => {
                r.positive
                    && matches!(r.kind, RelationKind::Response | RelationKind::Correlation)
            }
        }
    }

    pub fn satisfied(&self, history: &[Event]) -> bool {
        match self {
            Rule::Existential(e) => e.satisfied(history),
            Rule::Relation(r) => r.satisfied(history),
        }
    }

    pub fn pending(&self, history: &[Event]) -> bool {
        match self {
            Rule::Existential(_) => false,
            Rule::Relation(r) => r.pending(history),
        }
    }

    /// Violated by the prefix itself, not merely awaiting the next event.
    pub fn violated_on_prefix(&self, history: &[Event]) -> bool {
        !self.satisfied(history) && !self.pending(history)
    }

    /// Remap every symbol through `map`.
    pub fn translate(&self, map: &SymbolMap) -> Result<Rule> {
        let lookup = |s: &Symbol| {
            map.get(s)
                .cloned()
                .ok_or_else(|| ParleyError::incomplete_alignment(s.as_str()))
        };
        Ok(match self {
            Rule::Existential(e) => Rule::Existential(Existential {
                symbol: lookup(&e.symbol)?,
                ..e.clone()
            }),
            Rule::Relation(r) => Rule::Relation(Relation {
                a: lookup(&r.a)?,
                b: lookup(&r.b)?,
                ..r.clone()
            }),
        })
    }

    /// The same rule with flipped positivity.
    pub fn inverse(&self) -> Rule {
        match self {
            Rule::Existential(e) => Rule::Existential(Existential {
                positive: !e.positive,
                count: u32::from(!e.positive),
                ..e.clone()
            }),
            Rule::Relation(r) => Rule::Relation(Relation {
                positive: !r.positive,
                ..r.clone()
            }),
        }
    }

    /// Every (speaker, symbol) the rule refers to.
    pub fn symbols(&self) -> Vec<(AgentId, &Symbol)> {
        match self {
            Rule::Existential(e) => vec![(e.agent, &e.symbol)],
            Rule::Relation(r) => vec![(r.agent_a, &r.a), (r.agent_b, &r.b)],
        }
    }

    /// Symbols the rule attributes to `agent`.
    pub fn symbols_spoken_by(&self, agent: AgentId) -> Vec<&Symbol> {
        self.symbols()
            .into_iter()
            .filter(|(ag, _)| *ag == agent)
            .map(|(_, s)| s)
            .collect()
    }

    pub fn mentions(&self, agent: AgentId, symbol: &Symbol) -> bool {
        self.symbols()
            .iter()
            .any(|(ag, s)| *ag == agent && *s == symbol)
    }

    /// For a relation with (`agent`, `symbol`) on one side, the other side.
    pub fn counterpart(&self, agent: AgentId, symbol: &Symbol) -> Option<(AgentId, &Symbol)> {
        match self {
            Rule::Existential(_) => None,
            Rule::Relation(r) => {
                if r.agent_a == agent && &r.a == symbol {
                    Some((r.agent_b, &r.b))
                } else if r.agent_b == agent && &r.b == symbol {
                    Some((r.agent_a, &r.a))
                } else {
                    None
                }
            }
        }
    }

    pub fn kind(&self) -> Option<RelationKind> {
        match self {
            Rule::Existential(_) => None,
            Rule::Relation(r) => Some(r.kind),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.positive() { '+' } else { '-' };
        match self {
            Rule::Existential(e) => write!(f, "{}exists({}:{})", sign, e.agent, e.symbol),
            Rule::Relation(r) => write!(
                f,
                "{}{}({}:{}, {}:{})",
                sign, r.kind, r.agent_a, r.a, r.agent_b, r.b
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Persisted record shape
// ---------------------------------------------------------------------------

/// Positivity flag as persisted: `0`/`1`, booleans accepted on read.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
enum Flag {
    Int(i64),
    Bool(bool),
}

impl Flag {
    fn to_bool(self) -> Result<bool> {
        match self {
            Flag::Bool(b) => Ok(b),
            Flag::Int(0) => Ok(false),
            Flag::Int(1) => Ok(true),
            Flag::Int(other) => Err(ParleyError::MalformedRule(format!(
                "positivity must be 0 or 1, got {}",
                other
            ))),
        }
    }
}

/// Field-shaped rule record: `type` present means a relation, otherwise `a`
/// alone means an existential.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    a: Option<Symbol>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    b: Option<Symbol>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    n: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pos: Option<Flag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ag: Option<AgentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    agr: Option<AgentId>,
}

fn required<T>(value: Option<T>, field: &str, shape: &str) -> Result<T> {
    value.ok_or_else(|| ParleyError::MalformedRule(format!("{} record without `{}`", shape, field)))
}

impl TryFrom<RuleRecord> for Rule {
    type Error = ParleyError;

    fn try_from(rec: RuleRecord) -> Result<Self> {
        if let Some(kind) = rec.kind {
            let kind = kind.parse::<RelationKind>()?;
            Ok(Rule::Relation(Relation {
                a: required(rec.a, "a", "relation")?,
                b: required(rec.b, "b", "relation")?,
                kind,
                positive: required(rec.pos, "pos", "relation")?.to_bool()?,
                agent_a: required(rec.ag, "ag", "relation")?,
                agent_b: required(rec.agr, "agr", "relation")?,
            }))
        } else if let Some(symbol) = rec.a {
            if rec.b.is_some() || rec.agr.is_some() {
                return Err(ParleyError::MalformedRule(
                    "existential record carries relation fields but no `type`".into(),
                ));
            }
            let positive = required(rec.pos, "pos", "existential")?.to_bool()?;
            Ok(Rule::Existential(Existential {
                symbol,
                agent: required(rec.ag, "ag", "existential")?,
                positive,
                count: rec.n.unwrap_or(u32::from(positive)),
            }))
        } else {
            Err(ParleyError::MalformedRule(
                "record has neither `type` nor `a`".into(),
            ))
        }
    }
}

impl From<&Rule> for RuleRecord {
    fn from(rule: &Rule) -> Self {
        match rule {
            Rule::Existential(e) => RuleRecord {
                a: Some(e.symbol.clone()),
                n: Some(e.count),
                pos: Some(Flag::Int(i64::from(e.positive))),
                ag: Some(e.agent),
                ..Default::default()
            },
            Rule::Relation(r) => RuleRecord {
                a: Some(r.a.clone()),
                b: Some(r.b.clone()),
                kind: Some(r.kind.as_str().to_string()),
                pos: Some(Flag::Int(i64::from(r.positive))),
                ag: Some(r.agent_a),
                agr: Some(r.agent_b),
                ..Default::default()
            },
        }
    }
}

impl Serialize for Rule {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        RuleRecord::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Rule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let record = RuleRecord::deserialize(deserializer)?;
        Rule::try_from(record).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A0: AgentId = AgentId::FIRST;
    const A1: AgentId = AgentId::SECOND;

    fn h(events: &[(u8, &str)]) -> Vec<Event> {
        events
            .iter()
            .map(|(ag, s)| Event::new(AgentId::try_from(*ag).unwrap(), *s))
            .collect()
    }

    #[test]
    fn existential_positive_and_negative() {
        let pos = Rule::existential("a", A0, true);
        let neg = pos.inverse();
        let said = h(&[(1, "b"), (0, "a")]);
        let other_agent = h(&[(1, "a")]);
        assert!(pos.satisfied(&said));
        assert!(!neg.satisfied(&said));
        assert!(!pos.satisfied(&other_agent));
        assert!(neg.satisfied(&other_agent));
    }

    #[test]
    fn response_examples() {
        let r = Rule::relation("a", "b", RelationKind::Response, true, A0, A0);
        assert!(r.satisfied(&h(&[(0, "a"), (0, "b")])));
        assert!(!r.satisfied(&h(&[(0, "a")])));
        assert!(!r.satisfied(&h(&[(0, "a"), (0, "b"), (0, "a")])));
        assert!(r.satisfied(&[]));
    }

    #[test]
    fn negative_response_forbids_later_b() {
        let r = Rule::relation("a", "b", RelationKind::Response, false, A0, A1);
        assert!(r.satisfied(&h(&[(1, "b"), (0, "a")])));
        assert!(!r.satisfied(&h(&[(0, "a"), (0, "x"), (1, "b")])));
    }

    #[test]
    fn before_examples() {
        let r = Rule::relation("a", "b", RelationKind::Before, true, A0, A1);
        assert!(!r.satisfied(&h(&[(1, "b"), (0, "a")])));
        assert!(r.satisfied(&h(&[(0, "a"), (1, "b")])));
        assert!(r.satisfied(&h(&[(0, "x")])));
    }

    #[test]
    fn negative_before() {
        let r = Rule::relation("a", "b", RelationKind::Before, false, A0, A1);
        assert!(r.satisfied(&h(&[(1, "b"), (0, "a")])));
        assert!(!r.satisfied(&h(&[(0, "a"), (1, "b")])));
    }

    #[test]
    fn premise_examples() {
        let r = Rule::relation("a", "b", RelationKind::Premise, true, A0, A1);
        assert!(r.satisfied(&h(&[(0, "a"), (1, "b")])));
        assert!(!r.satisfied(&h(&[(0, "a"), (0, "x"), (1, "b")])));
        assert!(!r.satisfied(&h(&[(1, "b")])));
        let neg = r.inverse();
        assert!(!neg.satisfied(&h(&[(0, "a"), (1, "b")])));
        assert!(neg.satisfied(&h(&[(0, "a"), (0, "x"), (1, "b")])));
    }

    #[test]
    fn correlation_is_biconditional_when_positive() {
        let r = Rule::relation("a", "b", RelationKind::Correlation, true, A0, A1);
        assert!(r.satisfied(&[]));
        assert!(!r.satisfied(&h(&[(0, "a")])));
        assert!(!r.satisfied(&h(&[(1, "b")])));
        assert!(r.satisfied(&h(&[(1, "b"), (0, "a")])));
        let neg = r.inverse();
        assert!(neg.satisfied(&h(&[(0, "a")])));
        assert!(!neg.satisfied(&h(&[(1, "b"), (0, "a")])));
    }

    #[test]
    fn immediately_after_pending_only_at_tail() {
        let r = Rule::relation("a", "b", RelationKind::ImmediatelyAfter, true, A0, A1);
        let tail = h(&[(0, "a")]);
        assert!(!r.satisfied(&tail));
        assert!(r.pending(&tail));
        assert!(!r.violated_on_prefix(&tail));

        let broken = h(&[(0, "a"), (1, "x")]);
        assert!(!r.pending(&broken));
        assert!(r.violated_on_prefix(&broken));

        assert!(r.satisfied(&h(&[(0, "a"), (1, "b")])));
    }

    #[test]
    fn monotonic_classification() {
        assert!(Rule::existential("a", A0, true).is_monotonic());
        assert!(!Rule::existential("a", A0, false).is_monotonic());
        for kind in RelationKind::ALL {
            let pos = Rule::relation("a", "b", kind, true, A0, A1);
            let expected = matches!(kind, RelationKind::Response | RelationKind::Correlation);
            assert_eq!(pos.is_monotonic(), expected, "{}", kind);
            assert!(!pos.inverse().is_monotonic());
        }
    }

    #[test]
    fn translate_requires_every_symbol() {
        let r = Rule::relation("a", "b", RelationKind::Before, true, A0, A1);
        let mut map = SymbolMap::new();
        map.insert("a".into(), "x".into());
        assert_eq!(
            r.translate(&map),
            Err(ParleyError::incomplete_alignment("b"))
        );
        map.insert("b".into(), "y".into());
        assert_eq!(
            r.translate(&map).unwrap(),
            Rule::relation("x", "y", RelationKind::Before, true, A0, A1)
        );
    }

    #[test]
    fn counterpart_finds_other_side() {
        let r = Rule::relation("a", "b", RelationKind::Premise, true, A0, A1);
        assert_eq!(r.counterpart(A0, &"a".into()), Some((A1, &Symbol::from("b"))));
        assert_eq!(r.counterpart(A1, &"b".into()), Some((A0, &Symbol::from("a"))));
        assert_eq!(r.counterpart(A1, &"a".into()), None);
    }

    #[test]
    fn record_shape_selects_variant() {
        let rel: Rule = serde_json::from_str(
            r#"{"a":"s","b":"o","type":"correlation","pos":1,"ag":0,"agr":1}"#,
        )
        .unwrap();
        assert_eq!(
            rel,
            Rule::relation("s", "o", RelationKind::Correlation, true, A0, A1)
        );

        let ex: Rule = serde_json::from_str(r#"{"a":"o","n":0,"pos":0,"ag":1}"#).unwrap();
        assert_eq!(ex, Rule::existential("o", A1, false));
    }

    #[test]
    fn malformed_records_are_rejected() {
        assert!(serde_json::from_str::<Rule>(r#"{"b":"o","pos":1,"ag":0}"#).is_err());
        assert!(serde_json::from_str::<Rule>(r#"{"a":"s","type":"sometimes","pos":1,"ag":0,"agr":1}"#).is_err());
        assert!(serde_json::from_str::<Rule>(r#"{"a":"s","type":"before","pos":1,"ag":0}"#).is_err());
        assert!(serde_json::from_str::<Rule>(r#"{"a":"s","pos":3,"ag":0}"#).is_err());
    }

    #[test]
    fn serialized_existential_has_no_type_field() {
        let json = serde_json::to_value(Rule::existential("a", A0, true)).unwrap();
        assert!(json.get("type").is_none());
        assert_eq!(json["pos"], 1);
        assert_eq!(json["n"], 1);
    }
}
