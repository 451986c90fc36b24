//! Parley Runtime Prelude: convenient imports for common usage.
//!
//! ```rust
//! use parley_runtime::prelude::*;
//! ```

// Re-export the interaction runtime
pub use crate::channel::{duplex, CancelToken, Endpoint, Message};
pub use crate::interaction::{
    FailureCause, InteractionEvent, InteractionObserver, InteractionRecord, Interlocutor,
    NoopObserver, TranscriptObserver, TurnState,
};
pub use crate::exchange::{run_interaction, Exchange, ExchangeConfig, ExchangeReport};
pub use crate::error::{RuntimeError, RuntimeResult};

// Re-export experiment tooling
pub use crate::corpus::{load_corpus, random_pattern, save_corpus, GeneratorConfig, ProtocolGenerator};
pub use crate::experiment::{Experiment, ExperimentConfig, ExperimentReport, RunId};
pub use crate::metrics::{f_score, Score};

// Re-export agents and core
pub use parley_agents::prelude::*;
