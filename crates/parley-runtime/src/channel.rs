//! Message transport between the two interlocutors.
//!
//! Each side holds an [`Endpoint`]: a bounded sender towards the peer, a
//! receiver from it, and a shared [`CancelToken`]. Receiving races the next
//! message against cancellation and the per-turn timeout, so a silent or
//! vanished peer can never hang the other side.

use crate::interaction::FailureCause;
use parley_core::types::Symbol;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::debug;

/// What travels over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    Utterance(Symbol),
    /// The listener interpreted the last utterance.
    Ok,
    /// The sender could not continue; the interaction is over.
    Failed,
}

/// Cancellation shared by both endpoints of one interaction.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx: Arc::new(tx), rx }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once [`cancel`](Self::cancel) has been called.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                // The sender lives as long as any token; unreachable in practice.
                std::future::pending::<()>().await;
            }
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// One side of a duplex connection.
#[derive(Debug)]
pub struct Endpoint {
    tx: mpsc::Sender<Message>,
    rx: mpsc::Receiver<Message>,
    cancel: CancelToken,
    timeout: Duration,
}

/// Build two connected endpoints. Channels hold one message each: the
/// protocol is strictly request/acknowledge.
pub fn duplex(timeout: Duration) -> (Endpoint, Endpoint) {
    let (to_b, from_a) = mpsc::channel(1);
    let (to_a, from_b) = mpsc::channel(1);
    let cancel = CancelToken::new();
    let a = Endpoint {
        tx: to_b,
        rx: from_b,
        cancel: cancel.clone(),
        timeout,
    };
    let b = Endpoint {
        tx: to_a,
        rx: from_a,
        cancel,
        timeout,
    };
    (a, b)
}

impl Endpoint {
    pub async fn send(&self, message: Message) -> Result<(), FailureCause> {
        tokio::select! {
            sent = self.tx.send(message) => sent.map_err(|_| {
                self.cancel.cancel();
                FailureCause::Disconnected
            }),
            _ = self.cancel.cancelled() => Err(FailureCause::Cancelled),
        }
    }

    /// Wait for the peer's next message.
    ///
    /// A message already queued wins over a concurrent cancellation, so a
    /// peer's `Failed` sentinel is always seen as such.
    pub async fn recv(&mut self) -> Result<Message, FailureCause> {
        tokio::select! {
            biased;
            received = self.rx.recv() => match received {
                Some(message) => Ok(message),
                None => {
                    self.cancel.cancel();
                    Err(FailureCause::Disconnected)
                }
            },
            _ = self.cancel.cancelled() => Err(FailureCause::Cancelled),
            _ = tokio::time::sleep(self.timeout) => {
                debug!(timeout = ?self.timeout, "Receive timed out");
                self.cancel.cancel();
                Err(FailureCause::Timeout)
            }
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
