//! Registry configuration resolved once at startup.
//!
//! Each value comes from the command line or its environment variable
//! (clap handles both), falling back to the named preference store. The
//! resolved [`RegistryConfig`] is handed to the registry client; request code
//! never looks at the environment.

use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Default Terraform Cloud host
pub const DEFAULT_HOST: &str = "https://app.terraform.io";

/// Directory name of the preference store under the user config dir
const STORE_DIR: &str = "tfm";

/// File name of the preference store
const STORE_FILE: &str = "preferences.json";

/// Resolved registry connection settings
#[derive(Clone)]
pub struct RegistryConfig {
    /// Bearer token for the registry APIs
    pub token: String,
    /// Organization owning the private registry
    pub organization: String,
    /// Registry host, e.g. `https://app.terraform.io`
    pub host: Url,
    /// Per-request timeout; `None` keeps the transport default
    pub timeout: Option<Duration>,
}

impl std::fmt::Debug for RegistryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryConfig")
            .field("token", &"<redacted>")
            .field("organization", &self.organization)
            .field("host", &self.host.as_str())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl RegistryConfig {
    /// Base URL of the read-only module registry API
    pub fn lookup_base(&self) -> Url {
        with_path(&self.host, &["api", "registry", "v1", "modules"])
    }

    /// Base URL of the read-write management API
    pub fn management_base(&self) -> Url {
        with_path(&self.host, &["api", "v2"])
    }
}

fn with_path(host: &Url, segments: &[&str]) -> Url {
    let mut url = host.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

/// Values supplied by flags or environment variables
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Registry token
    pub token: Option<String>,
    /// Registry organization
    pub organization: Option<String>,
    /// Registry host
    pub host: Option<String>,
    /// Explicit preference store location
    pub preferences: Option<PathBuf>,
    /// Per-request timeout
    pub timeout: Option<Duration>,
}

/// Contents of the preference store
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Preferences {
    /// Stored token
    pub token: Option<String>,
    /// Stored organization
    pub organization: Option<String>,
    /// Stored host
    pub host: Option<String>,
}

impl Preferences {
    /// Read the store at `path`; a missing file yields empty preferences
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No preference store at {}", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError::Store {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
            }
        };

        serde_json::from_str(&content).map_err(|e| ConfigError::Store {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

/// Default preference store location, `<config dir>/tfm/preferences.json`
pub fn default_store_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(STORE_DIR).join(STORE_FILE))
}

impl RegistryConfig {
    /// Resolve configuration from overrides, falling back to the preference store
    pub fn resolve(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let preferences = load_preferences(&overrides)?;
        Self::from_parts(overrides, preferences)
    }

    /// Merge overrides over stored preferences
    pub fn from_parts(
        overrides: ConfigOverrides,
        preferences: Preferences,
    ) -> Result<Self, ConfigError> {
        let timeout = overrides.timeout;
        let merged = Merged::new(overrides, preferences);
        let token = merged.token.ok_or(ConfigError::MissingToken)?;
        let organization = merged.organization.ok_or(ConfigError::MissingOrganization)?;

        Ok(Self {
            token,
            organization,
            host: parse_host(&merged.host)?,
            timeout,
        })
    }
}

/// Where a module would be published; resolved without requiring a token
#[derive(Debug, Clone)]
pub struct RegistryTarget {
    /// Organization owning the private registry
    pub organization: String,
    /// Registry host
    pub host: Url,
    /// Whether a token was found
    pub has_token: bool,
}

impl RegistryTarget {
    /// Resolve organization and host from overrides and the preference store
    pub fn resolve(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let preferences = load_preferences(&overrides)?;
        Self::from_parts(overrides, preferences)
    }

    /// Merge overrides over stored preferences
    pub fn from_parts(
        overrides: ConfigOverrides,
        preferences: Preferences,
    ) -> Result<Self, ConfigError> {
        let merged = Merged::new(overrides, preferences);
        let organization = merged.organization.ok_or(ConfigError::MissingOrganization)?;

        Ok(Self {
            organization,
            host: parse_host(&merged.host)?,
            has_token: merged.token.is_some(),
        })
    }

    /// Base URL of the read-only module registry API
    pub fn lookup_base(&self) -> Url {
        with_path(&self.host, &["api", "registry", "v1", "modules"])
    }

    /// Base URL of the read-write management API
    pub fn management_base(&self) -> Url {
        with_path(&self.host, &["api", "v2"])
    }
}

fn load_preferences(overrides: &ConfigOverrides) -> Result<Preferences, ConfigError> {
    match overrides.preferences.clone().or_else(default_store_path) {
        Some(path) => Preferences::load(&path),
        None => Ok(Preferences::default()),
    }
}

/// Overrides layered over preferences, blanks dropped
struct Merged {
    token: Option<String>,
    organization: Option<String>,
    host: String,
}

impl Merged {
    fn new(overrides: ConfigOverrides, preferences: Preferences) -> Self {
        Self {
            token: non_empty(overrides.token).or_else(|| non_empty(preferences.token)),
            organization: non_empty(overrides.organization)
                .or_else(|| non_empty(preferences.organization)),
            host: non_empty(overrides.host)
                .or_else(|| non_empty(preferences.host))
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a registry host; a bare hostname is taken as https
pub fn parse_host(host: &str) -> Result<Url, ConfigError> {
    let candidate = if host.contains("://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    };

    let url = Url::parse(&candidate).map_err(|e| ConfigError::InvalidHost {
        host: host.to_string(),
        reason: e.to_string(),
    })?;

    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidHost {
            host: host.to_string(),
            reason: "expected an http(s) URL".to_string(),
        });
    }

    Ok(url)
}
