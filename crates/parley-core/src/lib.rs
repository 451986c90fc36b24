//! # Parley Core
//!
//! Rule model, protocols and the constraint engine shared by every Parley crate.
//!
//! Two agents with private vocabularies interact under a hidden *protocol*:
//! a set of temporal rules over who may say what, and when. This crate
//! defines:
//!
//! - **Rules**: `Existential` and `Relation` constraints with direct
//!   satisfaction semantics over a finite event history
//! - **Protocols**: a vocabulary plus rules, translatable under a symbol map
//! - **Engine**: violation listing, turn legality and bounded completion search
//!
//! ## Quick Start
//!
//! ```rust
//! use parley_core::prelude::*;
//!
//! let protocol = Protocol::new(
//!     vec!["a".into(), "b".into()],
//!     vec![Rule::relation("a", "b", RelationKind::Before, true, AgentId::FIRST, AgentId::SECOND)],
//!     "demo",
//! );
//!
//! let history = vec![Event::new(AgentId::FIRST, "a")];
//! let reply = Event::new(AgentId::SECOND, "b");
//! assert!(engine::is_legal(&protocol, &history, &reply));
//! ```

pub mod types;
pub mod rule;
pub mod protocol;
pub mod engine;
pub mod error;
pub mod prelude;
