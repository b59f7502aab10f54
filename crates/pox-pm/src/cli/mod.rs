//! CLI commands for the Composer package manager.
//!
//! This module provides the command-line interface for composer operations.

mod app;
mod commands;
mod output;
mod progress;

pub use app::{Cli, Commands, run};
pub use output::Output;
pub use progress::ProgressManager;
