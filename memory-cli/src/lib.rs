//! # memory-cli
//!
//! `memctl`: argument parsing, config loading, tracing setup and the command handlers.

pub mod cli;
pub mod commands;
pub mod config;
pub mod logger;

pub use cli::{Cli, Commands, IndexKind};
pub use commands::Backend;
pub use config::{AppConfig, MemoryBackend};
