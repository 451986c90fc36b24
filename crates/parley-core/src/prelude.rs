//! Parley Core Prelude: convenient imports for common usage.
//!
//! ```rust
//! use parley_core::prelude::*;
//! ```

// Re-export commonly used types
pub use crate::types::{
    AgentId, Symbol, Event, SymbolMap, invert,
    TurnPattern, Outcome,
};

// Re-export the rule model
pub use crate::rule::{Rule, Existential, Relation, RelationKind};

pub use crate::protocol::Protocol;

// The engine is used through its module path: `engine::is_legal(..)`
pub use crate::engine;

// Re-export error types
pub use crate::error::{ParleyError, Result};
