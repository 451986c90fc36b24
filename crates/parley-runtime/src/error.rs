//! Errors raised by the runtime.
//!
//! A failed interaction is an [`Outcome`](parley_core::types::Outcome), not an
//! error. These variants cover what stops the runtime itself.

use parley_core::error::ParleyError;
use thiserror::Error;

/// Result type for runtime operations.
pub type RuntimeResult<T> = std::result::Result<T, RuntimeError>;

#[derive(Error, Debug, Clone)]
pub enum RuntimeError {
    #[error(transparent)]
    Core(#[from] ParleyError),

    /// An interlocutor task panicked or was aborted.
    #[error("Interlocutor task failed: {0}")]
    Join(String),

    #[error("Protocol generation failed: {0}")]
    Generation(String),
}

impl From<tokio::task::JoinError> for RuntimeError {
    fn from(e: tokio::task::JoinError) -> Self {
        RuntimeError::Join(e.to_string())
    }
}

impl From<std::io::Error> for RuntimeError {
    fn from(e: std::io::Error) -> Self {
        RuntimeError::Core(e.into())
    }
}
