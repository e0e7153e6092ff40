//! Command line argument parsing and validation.
//!
//! Every global option can also come from its environment variable; values
//! still missing after that fall back to the preference store.

use crate::config::ConfigOverrides;
use crate::deploy::{MAX_ATTEMPTS, VerifyPolicy};
use crate::error::CliError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Publish modules to a private Terraform registry
#[derive(Parser, Debug)]
#[command(
    name = "tfm",
    version,
    about = "Publish and remove modules in a private Terraform registry",
    long_about = "Publish and remove modules in a private Terraform registry.

The module is read from package.json in the module directory. Its name must
look like <prefix>-<provider>-<name>, e.g. tfm-aws-vpc publishes module
'vpc' for provider 'aws'.

Usage:
  tfm deploy
  tfm delete
  TFMDIR=modules/vpc tfm deploy --verify-attempts 5"
)]
pub struct Args {
    /// Command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Module directory containing package.json
    #[arg(long, global = true, env = "TFMDIR", value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Registry API token
    #[arg(long, global = true, env = "TFM_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Organization owning the private registry
    #[arg(long, global = true, env = "TFM_ORGANIZATION", value_name = "ORG")]
    pub organization: Option<String>,

    /// Registry host
    #[arg(long, global = true, env = "TFM_HOST", value_name = "URL")]
    pub host: Option<String>,

    /// Preference store with fallback token/organization/host
    #[arg(long, global = true, env = "TFM_PREFERENCES", value_name = "FILE")]
    pub preferences: Option<PathBuf>,

    /// Per-request HTTP timeout in seconds
    #[arg(long, global = true, env = "TFM_TIMEOUT", value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Milliseconds to wait after upload before the first verification lookup
    #[arg(long, global = true, env = "TFM_SETTLE_MS", default_value_t = 2000)]
    pub settle_ms: u64,

    /// Verification lookups before reporting failure
    #[arg(long, global = true, env = "TFM_VERIFY_ATTEMPTS", default_value_t = 1)]
    pub verify_attempts: u32,

    /// Total verification wait budget in seconds
    #[arg(long, global = true, env = "TFM_VERIFY_MAX_WAIT", default_value_t = 30)]
    pub verify_max_wait_secs: u64,

    /// Log registry requests and responses
    #[arg(long, global = true)]
    pub debug: bool,

    /// Only print failures
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Register the module, replace the manifest version and upload it
    Deploy,
    /// Delete the module from the registry
    Delete,
    /// Show the module and registry target without contacting the registry
    Inspect,
}

impl Command {
    /// Command name for messages
    pub fn name(&self) -> &'static str {
        match self {
            Command::Deploy => "deploy",
            Command::Delete => "delete",
            Command::Inspect => "inspect",
        }
    }
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), CliError> {
        let invalid = |reason: String| CliError::InvalidArguments { reason };

        if let Some(dir) = &self.dir
            && !dir.is_dir()
        {
            return Err(invalid(format!(
                "Module directory {} does not exist",
                dir.display()
            )));
        }
        if self.timeout == Some(0) {
            return Err(invalid("--timeout must be greater than zero".to_string()));
        }
        if self.verify_attempts > MAX_ATTEMPTS {
            return Err(invalid(format!(
                "--verify-attempts too high: {} (max: {})",
                self.verify_attempts, MAX_ATTEMPTS
            )));
        }
        self.verify_policy().validate().map_err(invalid)
    }

    /// Module directory: `--dir`/`TFMDIR`, else the current directory
    pub fn module_dir(&self) -> std::io::Result<PathBuf> {
        match &self.dir {
            Some(dir) => Ok(dir.clone()),
            None => std::env::current_dir(),
        }
    }

    /// Verification polling settings
    pub fn verify_policy(&self) -> VerifyPolicy {
        VerifyPolicy {
            settle_delay: Duration::from_millis(self.settle_ms),
            attempts: self.verify_attempts,
            max_wait: Duration::from_secs(self.verify_max_wait_secs),
            ..VerifyPolicy::default()
        }
    }

    /// Flag/environment values for configuration resolution
    pub fn config_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            token: self.token.clone(),
            organization: self.organization.clone(),
            host: self.host.clone(),
            preferences: self.preferences.clone(),
            timeout: self.timeout.map(Duration::from_secs),
        }
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Output manager for colored terminal output
    output: super::OutputManager,
}

impl RuntimeConfig {
    /// Create runtime configuration
    pub fn new(quiet: bool, debug: bool) -> Self {
        Self {
            output: super::OutputManager::new(debug, quiet),
        }
    }

    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self::new(args.quiet, args.debug)
    }
}
