//! Shared types used across all Parley crates.

use crate::error::{ParleyError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identity of one of the two interlocutors (0 or 1).
///
/// Persisted as a bare integer, matching the `ag`/`agr` fields of rule records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct AgentId(u8);

impl AgentId {
    pub const FIRST: AgentId = AgentId(0);
    pub const SECOND: AgentId = AgentId(1);

    /// The other participant of the pair.
    pub fn interlocutor(self) -> AgentId {
        AgentId(1 - self.0)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn as_u8(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for AgentId {
    type Error = ParleyError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 | 1 => Ok(AgentId(value)),
            other => Err(ParleyError::InvalidPattern(format!(
                "agent id must be 0 or 1, got {}",
                other
            ))),
        }
    }
}

impl From<AgentId> for u8 {
    fn from(id: AgentId) -> Self {
        id.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An uninterpreted vocabulary symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A dated utterance: `agent` said `symbol` at this position of the history.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Event {
    pub agent: AgentId,
    pub symbol: Symbol,
}

impl Event {
    pub fn new(agent: AgentId, symbol: impl Into<Symbol>) -> Self {
        Self {
            agent,
            symbol: symbol.into(),
        }
    }

    /// Whether this event is `agent` uttering `symbol`.
    pub fn is(&self, agent: AgentId, symbol: &Symbol) -> bool {
        self.agent == agent && &self.symbol == symbol
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.agent, self.symbol)
    }
}

/// A (possibly partial) mapping between two vocabularies.
pub type SymbolMap = BTreeMap<Symbol, Symbol>;

/// Invert a bijective symbol map.
pub fn invert(map: &SymbolMap) -> SymbolMap {
    map.iter().map(|(k, v)| (v.clone(), k.clone())).collect()
}

/// The speaker of each turn of one interaction. Its length is the bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnPattern(Vec<AgentId>);

impl TurnPattern {
    pub fn new(turns: Vec<AgentId>) -> Result<Self> {
        if turns.is_empty() {
            return Err(ParleyError::InvalidPattern("pattern has no turns".into()));
        }
        Ok(Self(turns))
    }

    /// Build a pattern from raw agent indices, e.g. `[0, 1, 0, 1]`.
    pub fn from_ids(ids: &[u8]) -> Result<Self> {
        let turns = ids
            .iter()
            .map(|&id| AgentId::try_from(id))
            .collect::<Result<Vec<_>>>()?;
        Self::new(turns)
    }

    /// Strictly alternating turns starting with agent 0.
    pub fn alternating(bound: usize) -> Result<Self> {
        Self::new(
            (0..bound)
                .map(|i| if i % 2 == 0 { AgentId::FIRST } else { AgentId::SECOND })
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn turns(&self) -> &[AgentId] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.0.iter().copied()
    }
}

/// How one side ended an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Some turn had no legal choice, or the peer signaled failure.
    Failed,
    /// Completed and the full history satisfies the agent's protocol.
    Verified,
    /// Every turn of the pattern was played.
    Completed,
}

impl Outcome {
    /// Numeric outcome code: 0 failed, 1 verified, 2 completed.
    pub fn code(self) -> u8 {
        match self {
            Outcome::Failed => 0,
            Outcome::Verified => 1,
            Outcome::Completed => 2,
        }
    }

    pub fn is_success(self) -> bool {
        !matches!(self, Outcome::Failed)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Failed => write!(f, "failed"),
            Outcome::Verified => write!(f, "verified"),
            Outcome::Completed => write!(f, "completed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interlocutor_flips() {
        assert_eq!(AgentId::FIRST.interlocutor(), AgentId::SECOND);
        assert_eq!(AgentId::SECOND.interlocutor(), AgentId::FIRST);
    }

    #[test]
    fn agent_id_rejects_third_party() {
        assert!(AgentId::try_from(2).is_err());
        assert!(serde_json::from_str::<AgentId>("3").is_err());
        assert_eq!(serde_json::from_str::<AgentId>("1").unwrap(), AgentId::SECOND);
    }

    #[test]
    fn alternating_pattern_starts_with_first() {
        let p = TurnPattern::alternating(4).unwrap();
        assert_eq!(p.turns(), &[AgentId::FIRST, AgentId::SECOND, AgentId::FIRST, AgentId::SECOND]);
    }

    #[test]
    fn empty_pattern_is_rejected() {
        assert!(TurnPattern::new(vec![]).is_err());
        assert!(TurnPattern::from_ids(&[0, 2]).is_err());
    }

    #[test]
    fn outcome_codes() {
        assert_eq!(Outcome::Failed.code(), 0);
        assert_eq!(Outcome::Verified.code(), 1);
        assert_eq!(Outcome::Completed.code(), 2);
    }

    #[test]
    fn invert_swaps_pairs() {
        let mut map = SymbolMap::new();
        map.insert("a".into(), "a1".into());
        let inv = invert(&map);
        assert_eq!(inv.get(&Symbol::from("a1")), Some(&Symbol::from("a")));
    }
}
