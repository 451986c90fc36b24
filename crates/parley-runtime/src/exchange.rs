//! Running one interaction between two agents.

use crate::channel::duplex;
use crate::error::{RuntimeError, RuntimeResult};
use crate::interaction::{InteractionObserver, InteractionRecord, Interlocutor, NoopObserver};
use parley_agents::agent::Agent;
use parley_core::error::ParleyError;
use parley_core::protocol::Protocol;
use parley_core::types::{Outcome, TurnPattern};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info_span, Instrument};

/// Exchange configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    /// How long a side waits for any single message.
    pub turn_timeout_ms: u64,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            turn_timeout_ms: 5_000,
        }
    }
}

impl ExchangeConfig {
    pub fn turn_timeout(&self) -> Duration {
        Duration::from_millis(self.turn_timeout_ms)
    }

    pub fn validate(&self) -> parley_core::error::Result<()> {
        if self.turn_timeout_ms == 0 {
            return Err(ParleyError::invalid_config(
                "turn_timeout_ms",
                "0",
                "must be positive",
            ));
        }
        Ok(())
    }
}

/// Both agents, handed back, with what each of them saw.
#[derive(Debug)]
pub struct ExchangeReport {
    pub first: Agent,
    pub second: Agent,
    pub records: [InteractionRecord; 2],
    pub elapsed: Duration,
}

impl ExchangeReport {
    pub fn outcomes(&self) -> (Outcome, Outcome) {
        (self.records[0].outcome, self.records[1].outcome)
    }

    pub fn succeeded(&self) -> bool {
        self.records.iter().all(|r| r.outcome.is_success())
    }

    pub fn into_agents(self) -> (Agent, Agent) {
        (self.first, self.second)
    }
}

/// Runs interactions as a pair of concurrent tasks.
#[derive(Clone)]
pub struct Exchange {
    config: ExchangeConfig,
    observer: Arc<dyn InteractionObserver>,
}

impl Exchange {
    pub fn new(config: ExchangeConfig) -> Self {
        Self {
            config,
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn InteractionObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    /// Run one interaction. `first` sees `protocol_first`, `second` sees
    /// `protocol_second`; both follow `pattern`.
    pub async fn run(
        &self,
        first: Agent,
        second: Agent,
        protocol_first: Protocol,
        protocol_second: Protocol,
        pattern: TurnPattern,
    ) -> RuntimeResult<ExchangeReport> {
        self.config.validate()?;
        if first.id() == second.id() {
            return Err(RuntimeError::Core(ParleyError::invalid_config(
                "agent",
                first.id().to_string(),
                "both interlocutors share one id",
            )));
        }

        let started = Instant::now();
        let (end_first, end_second) = duplex(self.config.turn_timeout());
        let spawn = |agent: Agent, protocol: Protocol, endpoint| {
            let span = info_span!("interlocutor", agent = %agent.id(), protocol = %protocol.name());
            let side = Interlocutor::new(agent, protocol, pattern.clone(), endpoint, self.observer.clone());
            tokio::spawn(side.run().instrument(span))
        };
        let task_first = spawn(first, protocol_first, end_first);
        let task_second = spawn(second, protocol_second, end_second);

        let (done_first, done_second) = tokio::join!(task_first, task_second);
        let (first, record_first) = done_first?;
        let (second, record_second) = done_second?;

        Ok(ExchangeReport {
            first,
            second,
            records: [record_first, record_second],
            elapsed: started.elapsed(),
        })
    }
}

impl Default for Exchange {
    fn default() -> Self {
        Self::new(ExchangeConfig::default())
    }
}

/// Run one interaction with the default configuration.
pub async fn run_interaction(
    first: Agent,
    second: Agent,
    protocol_first: Protocol,
    protocol_second: Protocol,
    pattern: TurnPattern,
) -> RuntimeResult<ExchangeReport> {
    Exchange::default()
        .run(first, second, protocol_first, protocol_second, pattern)
        .await
}
