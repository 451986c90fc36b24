//! Strategy seams of an agent.
//!
//! An [`Agent`](crate::agent::Agent) is composed of three independently
//! swappable capabilities:
//!
//! - [`UtterancePolicy`]: in which order to try own symbols when speaking
//! - [`InterpretationPolicy`]: how to read a received foreign symbol, and
//!   what to learn from the candidates that turned out illegal
//! - [`MonotonicHandler`]: how to react to monotonic rules, which the
//!   legality check deliberately ignores
//!
//! All three operate on the agent's [`Beliefs`] and see the current
//! [`Turn`].

use crate::alignment::{Alignment, MappingsMade};
use parley_core::protocol::Protocol;
use parley_core::types::{AgentId, Event, Outcome, Symbol};
use rand::rngs::StdRng;

/// What a policy sees of the interaction at one turn.
#[derive(Debug, Clone, Copy)]
pub struct Turn<'a> {
    /// The agent's own protocol view.
    pub protocol: &'a Protocol,
    /// The agent's local history so far, in its own vocabulary.
    pub history: &'a [Event],
    pub me: AgentId,
    pub vocabulary: &'a [Symbol],
}

impl<'a> Turn<'a> {
    pub fn interlocutor(&self) -> AgentId {
        self.me.interlocutor()
    }

    /// The event of `symbol` being said by the interlocutor.
    pub fn heard(&self, symbol: &Symbol) -> Event {
        Event::new(self.interlocutor(), symbol.clone())
    }

    /// The event of `symbol` being said by this agent.
    pub fn uttered(&self, symbol: &Symbol) -> Event {
        Event::new(self.me, symbol.clone())
    }
}

/// Mutable state an agent carries across interactions, plus the working
/// map of the current one.
#[derive(Debug, Clone)]
pub struct Beliefs {
    pub alignment: Alignment,
    pub mappings: MappingsMade,
    pub rng: StdRng,
}

pub trait UtterancePolicy: Send {
    fn name(&self) -> &'static str;

    /// Own symbols in the order they should be tried. The agent utters the
    /// first one that is legal.
    fn candidates(&self, turn: &Turn<'_>, rng: &mut StdRng) -> Vec<Symbol>;
}

pub trait InterpretationPolicy: Send {
    fn name(&self) -> &'static str;

    /// Called once before every interaction.
    fn begin(&mut self, _beliefs: &mut Beliefs) {}

    /// Choose a legal native reading of `received`, updating beliefs from
    /// every candidate examined. `None` fails the interaction.
    fn interpret(&mut self, turn: &Turn<'_>, received: &Symbol, beliefs: &mut Beliefs) -> Option<Symbol>;

    /// Final outcome once the interaction ends. `completed` is whether every
    /// turn of the pattern was played.
    fn finish(&mut self, _turn: &Turn<'_>, completed: bool, _beliefs: &mut Beliefs) -> Outcome {
        if completed {
            Outcome::Completed
        } else {
            Outcome::Failed
        }
    }

    /// The remaining bijections, for strategies that keep them.
    fn possible_worlds(&self) -> Option<&crate::worlds::PossibleWorlds> {
        None
    }
}

pub trait MonotonicHandler: Send {
    fn name(&self) -> &'static str;

    /// After `received` was read as `interpretation`; `turn.history` does not
    /// yet contain the new event.
    fn on_interpreted(
        &mut self,
        _turn: &Turn<'_>,
        _received: &Symbol,
        _interpretation: &Symbol,
        _beliefs: &mut Beliefs,
    ) {
    }

    /// After every turn of the pattern was played.
    fn on_complete(&mut self, _turn: &Turn<'_>, _beliefs: &mut Beliefs) {}
}
