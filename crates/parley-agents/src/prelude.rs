//! Parley Agents Prelude: convenient imports for common usage.
//!
//! ```rust
//! use parley_agents::prelude::*;
//! ```

// Re-export agent types
pub use crate::agent::{Agent, AgentBuilder, AgentKind};
pub use crate::alignment::{Alignment, MappingsMade};
pub use crate::worlds::PossibleWorlds;
pub use crate::config::LearningConfig;

// Re-export strategy seams and implementations
pub use crate::policy::{Beliefs, InterpretationPolicy, MonotonicHandler, Turn, UtterancePolicy};
pub use crate::utterance::{CooperativeUtterance, PlainUtterance, StudentUtterance};
pub use crate::interpretation::{Reinforcement, WeightedInterpreter, WorldEliminator};
pub use crate::monotonic::{MonotonicPenalty, MonotonicReward, NoMonotonic};

// Re-export from core
pub use parley_core::prelude::*;
