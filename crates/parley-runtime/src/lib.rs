//! # Parley Runtime
//!
//! Runs interactions between agents and the experiments built from them.
//!
//! Each interaction is two tokio tasks, one per agent, connected by a
//! bounded duplex channel. Neither side ever sees the other's protocol or
//! alignment: only symbols and acknowledgements cross the channel.
//!
//! ```rust,no_run
//! use parley_runtime::prelude::*;
//!
//! # async fn demo() -> RuntimeResult<()> {
//! let v0: Vec<Symbol> = vec!["o".into(), "s".into()];
//! let v1: Vec<Symbol> = vec!["o1".into(), "s1".into()];
//! let map: SymbolMap = v0.iter().cloned().zip(v1.iter().cloned()).collect();
//! let p0 = Protocol::new(v0.clone(), vec![Rule::existential("o", AgentId::FIRST, true)], "demo");
//! let p1 = p0.translate(&map)?;
//!
//! let a = AgentBuilder::new(AgentId::FIRST, v0).build()?;
//! let b = AgentBuilder::new(AgentId::SECOND, v1).build()?;
//! let report = run_interaction(a, b, p0, p1, TurnPattern::alternating(2)?).await?;
//! println!("{:?}", report.outcomes());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod channel;
pub mod interaction;
pub mod exchange;
pub mod corpus;
pub mod metrics;
pub mod experiment;
pub mod prelude;
