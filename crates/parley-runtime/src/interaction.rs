//! The per-agent interaction state machine.
//!
//! An [`Interlocutor`] walks the turn pattern. On its own turns it speaks
//! and waits for the peer's acknowledgement; on the peer's turns it waits
//! for an utterance, interprets it and acknowledges. Either side ends the
//! interaction by sending [`Message::Failed`] and halting.

use crate::channel::{Endpoint, Message};
use parley_agents::agent::Agent;
use parley_core::protocol::Protocol;
use parley_core::types::{AgentId, Event, Outcome, Symbol, TurnPattern};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Why an interaction ended early, or why verification rejected it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureCause {
    /// Every candidate utterance was illegal.
    NoUtterance,
    /// No legal reading for a received symbol.
    NoInterpretation,
    /// The peer sent the failure sentinel.
    PeerFailed,
    Timeout,
    Disconnected,
    Cancelled,
    /// A message arrived out of turn.
    UnexpectedMessage,
    /// The interaction completed but failed full verification.
    Inconsistent,
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureCause::NoUtterance => "no legal utterance",
            FailureCause::NoInterpretation => "no legal interpretation",
            FailureCause::PeerFailed => "peer failed",
            FailureCause::Timeout => "timed out",
            FailureCause::Disconnected => "peer disconnected",
            FailureCause::Cancelled => "cancelled",
            FailureCause::UnexpectedMessage => "unexpected message",
            FailureCause::Inconsistent => "verification failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    AwaitingTurn { turn: usize, speaker: AgentId },
    Failed(FailureCause),
    Complete,
}

impl TurnState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TurnState::AwaitingTurn { .. })
    }
}

/// What one side saw of a finished interaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionRecord {
    pub agent: AgentId,
    pub outcome: Outcome,
    pub cause: Option<FailureCause>,
    /// The local history, with received symbols in their local reading.
    pub history: Vec<Event>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum InteractionEvent {
    Started {
        agent: AgentId,
        turns: usize,
    },
    Uttered {
        agent: AgentId,
        turn: usize,
        symbol: Symbol,
    },
    Interpreted {
        agent: AgentId,
        turn: usize,
        received: Symbol,
        interpretation: Symbol,
    },
    Failed {
        agent: AgentId,
        turn: usize,
        cause: FailureCause,
    },
    Finished {
        agent: AgentId,
        outcome: Outcome,
    },
}

/// Receives events from both interlocutors of an exchange.
pub trait InteractionObserver: Send + Sync {
    fn observe(&self, event: &InteractionEvent);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl InteractionObserver for NoopObserver {
    fn observe(&self, _event: &InteractionEvent) {}
}

/// Collects every event, in arrival order.
#[derive(Debug, Default)]
pub struct TranscriptObserver {
    events: Mutex<Vec<InteractionEvent>>,
}

impl TranscriptObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<InteractionEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Drain the transcript.
    pub fn take(&self) -> Vec<InteractionEvent> {
        self.events
            .lock()
            .map(|mut e| std::mem::take(&mut *e))
            .unwrap_or_default()
    }
}

impl InteractionObserver for TranscriptObserver {
    fn observe(&self, event: &InteractionEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// One agent's side of an interaction.
pub struct Interlocutor {
    agent: Agent,
    protocol: Protocol,
    pattern: TurnPattern,
    endpoint: Endpoint,
    observer: Arc<dyn InteractionObserver>,
}

impl Interlocutor {
    pub fn new(
        agent: Agent,
        protocol: Protocol,
        pattern: TurnPattern,
        endpoint: Endpoint,
        observer: Arc<dyn InteractionObserver>,
    ) -> Self {
        Self {
            agent,
            protocol,
            pattern,
            endpoint,
            observer,
        }
    }

    pub fn id(&self) -> AgentId {
        self.agent.id()
    }

    /// Run the interaction to a terminal state and hand the agent back.
    pub async fn run(mut self) -> (Agent, InteractionRecord) {
        let me = self.agent.id();
        self.agent.begin_interaction();
        self.observer.observe(&InteractionEvent::Started {
            agent: me,
            turns: self.pattern.len(),
        });

        let mut history = Vec::with_capacity(self.pattern.len());
        let mut state = self.awaiting(0);
        while let TurnState::AwaitingTurn { turn, speaker } = state {
            let step = if speaker == me {
                self.speak(turn, &mut history).await
            } else {
                self.listen(turn, speaker, &mut history).await
            };
            state = match step {
                Ok(()) => self.awaiting(turn + 1),
                Err(cause) => {
                    debug!(
                        agent = %me,
                        turn,
                        %cause,
                        turn_timeout = ?self.endpoint.timeout(),
                        "Interaction failed"
                    );
                    self.observer.observe(&InteractionEvent::Failed {
                        agent: me,
                        turn,
                        cause,
                    });
                    TurnState::Failed(cause)
                }
            };
        }

        let completed = state == TurnState::Complete;
        let outcome = self.agent.finish(&self.protocol, &history, completed);
        let cause = match state {
            TurnState::Failed(cause) => Some(cause),
            _ if outcome == Outcome::Failed => Some(FailureCause::Inconsistent),
            _ => None,
        };
        info!(agent = %me, %outcome, turns = history.len(), "Interaction finished");
        self.observer.observe(&InteractionEvent::Finished { agent: me, outcome });

        let record = InteractionRecord {
            agent: me,
            outcome,
            cause,
            history,
        };
        (self.agent, record)
    }

    fn awaiting(&self, turn: usize) -> TurnState {
        match self.pattern.turns().get(turn) {
            Some(&speaker) => TurnState::AwaitingTurn { turn, speaker },
            None => TurnState::Complete,
        }
    }

    async fn speak(&mut self, turn: usize, history: &mut Vec<Event>) -> Result<(), FailureCause> {
        let me = self.agent.id();
        let Some(symbol) = self.agent.speak(&self.protocol, history) else {
            let _ = self.endpoint.send(Message::Failed).await;
            return Err(FailureCause::NoUtterance);
        };
        self.endpoint.send(Message::Utterance(symbol.clone())).await?;
        history.push(Event::new(me, symbol.clone()));
        self.observer.observe(&InteractionEvent::Uttered {
            agent: me,
            turn,
            symbol,
        });

        match self.endpoint.recv().await? {
            Message::Ok => Ok(()),
            Message::Failed => Err(FailureCause::PeerFailed),
            Message::Utterance(_) => {
                self.endpoint.cancel();
                Err(FailureCause::UnexpectedMessage)
            }
        }
    }

    async fn listen(&mut self, turn: usize, speaker: AgentId, history: &mut Vec<Event>) -> Result<(), FailureCause> {
        let received = match self.endpoint.recv().await? {
            Message::Utterance(symbol) => symbol,
            Message::Failed => return Err(FailureCause::PeerFailed),
            Message::Ok => {
                self.endpoint.cancel();
                return Err(FailureCause::UnexpectedMessage);
            }
        };

        let Some(interpretation) = self.agent.hear(&self.protocol, history, &received) else {
            let _ = self.endpoint.send(Message::Failed).await;
            return Err(FailureCause::NoInterpretation);
        };
        history.push(Event::new(speaker, interpretation.clone()));
        self.observer.observe(&InteractionEvent::Interpreted {
            agent: self.agent.id(),
            turn,
            received,
            interpretation,
        });
        self.endpoint.send(Message::Ok).await
    }
}

impl fmt::Debug for Interlocutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interlocutor")
            .field("agent", &self.agent)
            .field("protocol", &self.protocol.name())
            .field("pattern", &self.pattern)
            .finish()
    }
}
