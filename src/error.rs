//! Error types for tfm_deploy operations.
//!
//! This module defines the crate-wide error with actionable messages and
//! recovery suggestions. Registry API failures live in [`crate::registry::ApiError`];
//! the deploy workflow folds them into its outcome instead of returning them.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for tfm_deploy operations
pub type Result<T> = std::result::Result<T, DeployError>;

/// Main error type for all tfm_deploy operations
#[derive(Error, Debug)]
pub enum DeployError {
    /// Module manifest errors
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// Configuration and credential errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Archive creation errors
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while deriving a module descriptor from `package.json`
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Manifest missing or unreadable
    #[error("Could not read {path}: {source}")]
    Read {
        /// Path of the manifest
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Manifest is not valid JSON
    #[error("Malformed manifest {path}: {source}")]
    Malformed {
        /// Path of the manifest
        path: PathBuf,
        /// Parse error
        #[source]
        source: serde_json::Error,
    },

    /// Required field absent, empty or not a string
    #[error("Manifest {path} has no usable '{field}' field")]
    MissingField {
        /// Path of the manifest
        path: PathBuf,
        /// Field name
        field: &'static str,
    },

    /// Package name does not follow `<prefix>-<provider>-<name>`
    #[error("Invalid module name '{name}': {reason}")]
    InvalidName {
        /// Package name as found in the manifest
        name: String,
        /// Reason for the error
        reason: String,
    },
}

/// Configuration resolution errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No token from flags, environment or preference store
    #[error("No registry token configured")]
    MissingToken,

    /// No organization from flags, environment or preference store
    #[error("No registry organization configured")]
    MissingOrganization,

    /// Preference store exists but cannot be used
    #[error("Preference store {path} is unusable: {reason}")]
    Store {
        /// Path of the preference store
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },

    /// Registry host is not a usable base URL
    #[error("Invalid registry host '{host}': {reason}")]
    InvalidHost {
        /// Host as given
        host: String,
        /// Reason for the error
        reason: String,
    },

    /// Token contains characters not allowed in an HTTP header
    #[error("Registry token is not a valid HTTP header value")]
    InvalidToken,

    /// HTTP client could not be built
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Archive creation errors
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Source root missing or not a directory
    #[error("Module source {path} is not a directory")]
    NotADirectory {
        /// Path given as archive root
        path: PathBuf,
    },

    /// Directory traversal failed
    #[error("Failed to walk {path}: {source}")]
    Walk {
        /// Archive root
        path: PathBuf,
        /// Underlying walkdir error
        #[source]
        source: walkdir::Error,
    },

    /// Writing an entry or finishing the stream failed
    #[error("Failed to archive {path}: {source}")]
    Write {
        /// Entry being written
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Archive task panicked or was cancelled
    #[error("Archive task failed: {0}")]
    Join(String),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },
}

impl DeployError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            DeployError::Manifest(ManifestError::Read { path, .. }) => vec![
                format!("Create {} or run from the module directory", path.display()),
                "Point TFMDIR or --dir at the module directory".to_string(),
            ],
            DeployError::Manifest(ManifestError::InvalidName { .. }) => vec![
                "Name the package '<prefix>-<provider>-<name>', e.g. 'tfm-aws-vpc'".to_string(),
            ],
            DeployError::Config(ConfigError::MissingToken) => vec![
                "Set TFM_TOKEN or pass --token".to_string(),
                "Add a \"token\" entry to the preference store".to_string(),
            ],
            DeployError::Config(ConfigError::MissingOrganization) => vec![
                "Set TFM_ORGANIZATION or pass --organization".to_string(),
                "Add an \"organization\" entry to the preference store".to_string(),
            ],
            DeployError::Config(ConfigError::Store { path, .. }) => vec![format!(
                "Fix or remove {}; it must be a JSON object with token/organization/host",
                path.display()
            )],
            DeployError::Cli(_) => vec!["Run 'tfm --help' for usage".to_string()],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }
}
