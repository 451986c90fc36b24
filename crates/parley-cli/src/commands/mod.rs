//! CLI command implementations.

pub mod init;
pub mod generate;
pub mod run;
pub mod show;
