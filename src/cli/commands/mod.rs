//! Command execution functions.
//!
//! Each command returns its exit code; errors that escape a command are
//! printed with recovery suggestions and turned into exit code 1.

mod delete;
mod deploy;
mod helpers;
mod inspect;

use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::{DeployError, Result};

use delete::execute_delete;
use deploy::execute_deploy;
use inspect::execute_inspect;

/// Execute the main command based on parsed arguments
pub async fn execute_command(args: Args) -> Result<i32> {
    // Validate arguments
    if let Err(validation_error) = args.validate() {
        // Create output for validation errors (never quiet)
        let output = super::OutputManager::new(false, false);
        let error = DeployError::from(validation_error);
        output.error(&error.to_string());
        output.suggestions(&error.recovery_suggestions());
        return Ok(1);
    }

    let config = RuntimeConfig::from(&args);

    let result = match args.command {
        Command::Deploy => execute_deploy(&args, &config).await,
        Command::Delete => execute_delete(&args, &config).await,
        Command::Inspect => execute_inspect(&args, &config),
    };

    match result {
        Ok(exit_code) => Ok(exit_code),
        Err(e) => {
            let output = config.output();
            output.error(&format!("Command '{}' failed: {}", args.command.name(), e));
            output.suggestions(&e.recovery_suggestions());

            Ok(1)
        }
    }
}
