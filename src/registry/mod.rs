//! Terraform private registry API access.
//!
//! [`RegistryApi`] is the seam between the deploy workflow and HTTP. Every
//! operation returns an explicit [`ApiResult`]; a 404 on a lookup is an
//! ordinary `Ok(None)`, never an error.

mod client;
mod types;

pub use client::RegistryClient;
pub use types::{ModuleVersion, RegistryModule};

use crate::metadata::ModuleId;
use bytes::Bytes;
use std::future::Future;
use thiserror::Error;

/// Result of a registry API call
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Registry API failures
#[derive(Error, Debug)]
pub enum ApiError {
    /// Non-success HTTP status
    #[error("{method} {url} returned HTTP {status}{}", detail_suffix(.detail))]
    Status {
        /// HTTP method
        method: &'static str,
        /// Request URL
        url: String,
        /// HTTP status code
        status: u16,
        /// First JSON:API error title/detail, if the body had one
        detail: Option<String>,
    },

    /// Request never produced a response
    #[error("{method} {url} failed: {source}")]
    Transport {
        /// HTTP method
        method: &'static str,
        /// Request URL
        url: String,
        /// Underlying reqwest error
        #[source]
        source: reqwest::Error,
    },

    /// Response body did not match the expected shape
    #[error("Unexpected response from {url}: {reason}")]
    Decode {
        /// Request URL
        url: String,
        /// Reason for the error
        reason: String,
    },

    /// Create-version response carried no upload link
    #[error("Registry did not return an upload URL for v{version}")]
    MissingUploadLink {
        /// Version that was created
        version: String,
    },
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(": {d}"))
        .unwrap_or_default()
}

impl ApiError {
    /// HTTP status code, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Actionable hints for statuses the user can do something about
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self.status() {
            Some(401) => vec!["Verify the API token is valid and not expired".to_string()],
            Some(403) => vec![
                "Verify the token has permission to manage the private registry".to_string(),
            ],
            Some(404) => vec![
                "Check the organization name and that the module exists in its registry"
                    .to_string(),
            ],
            _ => Vec::new(),
        }
    }
}

/// Operations the deploy workflow needs from the registry
pub trait RegistryApi {
    /// Look up a module by `(organization, name, provider)`
    fn lookup_module(
        &self,
        id: &ModuleId,
    ) -> impl Future<Output = ApiResult<Option<RegistryModule>>>;

    /// Look up one version of a module
    fn lookup_module_version(
        &self,
        id: &ModuleId,
        version: &str,
    ) -> impl Future<Output = ApiResult<Option<ModuleVersion>>>;

    /// Register a module in the private registry
    fn create_module(&self, id: &ModuleId) -> impl Future<Output = ApiResult<RegistryModule>>;

    /// Create a version record; the result carries the upload URL
    fn create_module_version(
        &self,
        id: &ModuleId,
        version: &str,
    ) -> impl Future<Output = ApiResult<ModuleVersion>>;

    /// Delete a module (and, server side, its versions)
    fn delete_module(&self, id: &ModuleId) -> impl Future<Output = ApiResult<()>>;

    /// Delete one version of a module
    fn delete_module_version(
        &self,
        id: &ModuleId,
        version: &str,
    ) -> impl Future<Output = ApiResult<()>>;

    /// PUT the archive to a pre-signed upload URL
    fn upload_archive(&self, url: &str, archive: Bytes) -> impl Future<Output = ApiResult<()>>;
}
