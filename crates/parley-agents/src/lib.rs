//! # Parley Agents
//!
//! Alignment strategies for agents that learn to read each other's
//! vocabulary by interacting under a hidden protocol.
//!
//! An [`Agent`](agent::Agent) composes three swappable capabilities:
//!
//! - **Utterance**: plain, student (information seeking) or cooperative
//! - **Interpretation**: frequency learning, causal reinforcement
//!   (the "reasoner") or possible-world elimination (the "logical" agent)
//! - **Monotonic handling**: none, per-turn rewards or end-of-interaction
//!   penalties
//!
//! Presets are selected with [`AgentKind`](agent::AgentKind).

pub mod alignment;
pub mod worlds;
pub mod config;
pub mod policy;
pub mod utterance;
pub mod interpretation;
pub mod monotonic;
pub mod agent;
pub mod prelude;
