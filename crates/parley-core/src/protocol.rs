//! Protocols: a named vocabulary plus the rules that govern it.
//!
//! A protocol is immutable once built. Each agent holds its own view,
//! expressed in its own vocabulary; the two views of one interaction are
//! mirror images under the ground-truth alignment (see [`Protocol::translate`]).

use crate::error::{ParleyError, Result};
use crate::rule::{RelationKind, Rule, RuleRecord};
use crate::types::{AgentId, Symbol, SymbolMap};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

/// A vocabulary plus an ordered collection of rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ProtocolRecord", into = "ProtocolRecord")]
pub struct Protocol {
    vocabulary: Vec<Symbol>,
    rules: Vec<Rule>,
    name: String,
}

/// Persisted shape: `{vocabulary, rules, name}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProtocolRecord {
    vocabulary: Vec<Symbol>,
    rules: Vec<RuleRecord>,
    name: String,
}

impl TryFrom<ProtocolRecord> for Protocol {
    type Error = ParleyError;

    fn try_from(rec: ProtocolRecord) -> Result<Self> {
        let rules = rec
            .rules
            .into_iter()
            .map(Rule::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(Protocol::new(rec.vocabulary, rules, rec.name))
    }
}

impl From<Protocol> for ProtocolRecord {
    fn from(p: Protocol) -> Self {
        ProtocolRecord {
            rules: p.rules.iter().map(RuleRecord::from).collect(),
            vocabulary: p.vocabulary,
            name: p.name,
        }
    }
}

impl Protocol {
    /// Build a protocol. Duplicate vocabulary entries are dropped, first
    /// occurrence wins.
    pub fn new(vocabulary: Vec<Symbol>, rules: Vec<Rule>, name: impl Into<String>) -> Self {
        let mut seen = BTreeSet::new();
        let vocabulary = vocabulary
            .into_iter()
            .filter(|s| seen.insert(s.clone()))
            .collect();
        Self {
            vocabulary,
            rules,
            name: name.into(),
        }
    }

    pub fn vocabulary(&self) -> &[Symbol] {
        &self.vocabulary
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.vocabulary.contains(symbol)
    }

    /// A copy of this protocol with one more rule appended.
    pub fn with_rule(&self, rule: Rule) -> Protocol {
        let mut next = self.clone();
        next.rules.push(rule);
        next
    }

    /// Remap vocabulary and rules through `map`, naming the result
    /// `<name>-translated`. Fails on the first unmapped symbol, and when two
    /// vocabulary symbols map to the same target.
    pub fn translate(&self, map: &SymbolMap) -> Result<Protocol> {
        let mut sources: BTreeMap<&Symbol, &Symbol> = BTreeMap::new();
        let mut vocabulary = Vec::with_capacity(self.vocabulary.len());
        for s in &self.vocabulary {
            let target = map
                .get(s)
                .ok_or_else(|| ParleyError::incomplete_alignment(s.as_str()))?;
            if let Some(first) = sources.insert(target, s) {
                return Err(ParleyError::ambiguous_alignment(
                    first.as_str(),
                    s.as_str(),
                    target.as_str(),
                ));
            }
            vocabulary.push(target.clone());
        }
        let rules = self
            .rules
            .iter()
            .map(|r| r.translate(map))
            .collect::<Result<Vec<_>>>()?;
        Ok(Protocol::new(
            vocabulary,
            rules,
            format!("{}-translated", self.name),
        ))
    }

    /// Rules that mention `symbol` as spoken by `agent`.
    pub fn rules_mentioning<'a>(
        &'a self,
        agent: AgentId,
        symbol: &'a Symbol,
    ) -> impl Iterator<Item = &'a Rule> + 'a {
        self.rules.iter().filter(move |r| r.mentions(agent, symbol))
    }

    /// Whether `symbol`, said by `speaker`, triggers a non-monotonic
    /// relation whose consequence is spoken by `listener`. Positive
    /// `before`/`premise` rules are excluded: they constrain the trigger's
    /// follow-up rather than inform the listener.
    pub fn informative_premise(&self, symbol: &Symbol, speaker: AgentId, listener: AgentId) -> bool {
        self.relations().any(|(rule, r)| {
            !rule.is_monotonic()
                && &r.a == symbol
                && r.agent_a == speaker
                && r.agent_b == listener
                && !(r.positive && matches!(r.kind, RelationKind::Before | RelationKind::Premise))
        })
    }

    /// Whether `symbol` triggers a non-monotonic relation whose both sides
    /// are spoken by `speaker`.
    pub fn self_premise(&self, symbol: &Symbol, speaker: AgentId) -> bool {
        self.relations().any(|(rule, r)| {
            !rule.is_monotonic() && &r.a == symbol && r.agent_a == speaker && r.agent_b == speaker
        })
    }

    /// Whether `symbol`, said by `speaker`, is the required predecessor of a
    /// positive `before`/`premise` rule.
    pub fn constraining_premise(&self, symbol: &Symbol, speaker: AgentId) -> bool {
        self.relations().any(|(_, r)| {
            r.positive
                && matches!(r.kind, RelationKind::Before | RelationKind::Premise)
                && &r.a == symbol
                && r.agent_a == speaker
        })
    }

    fn relations(&self) -> impl Iterator<Item = (&Rule, &crate::rule::Relation)> {
        self.rules.iter().filter_map(|rule| match rule {
            Rule::Relation(r) => Some((rule, r)),
            Rule::Existential(_) => None,
        })
    }

    // ---- Persistence ----

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a persisted protocol. Rule records that match neither shape are
    /// reported as [`ParleyError::MalformedRule`].
    pub fn from_json(json: &str) -> Result<Protocol> {
        let record: ProtocolRecord = serde_json::from_str(json)?;
        Protocol::try_from(record)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Protocol> {
        let json = std::fs::read_to_string(path)?;
        Protocol::from_json(&json)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [", self.name)?;
        for (i, rule) in self.rules.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", rule)?;
        }
        write!(f, "]")
    }
}
