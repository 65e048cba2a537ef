//! Tooling & Integration Layer
//!
//! Command-line entry points over the sync engine.

pub mod cli;

pub use cli::{Cli, CliContext, Commands, ConfigCommands};
