//! Command line interface for tfm.
//!
//! Argument parsing, command dispatch and colored console output around the
//! deploy workflow.

mod args;
pub mod commands;
mod output;

pub use args::{Args, Command, RuntimeConfig};
pub use commands::execute_command;
pub use output::OutputManager;

use crate::error::Result;

/// Main CLI entry point
pub async fn run(args: Args) -> Result<i32> {
    execute_command(args).await
}

/// Parse arguments without executing (for testing)
pub fn parse_args() -> Args {
    Args::parse_args()
}
