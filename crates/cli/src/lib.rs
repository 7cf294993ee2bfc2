//! CLI tool for inspecting replica oracle decisions.
//!
//! Provides commands for:
//! - Planning a set of ranges against a cluster description
//! - Listing the registered selection policies

pub mod cluster;
pub mod commands;
pub mod config;

pub use cluster::ClusterFile;
pub use commands::{Command, CommandResult};
pub use config::CliConfig;
