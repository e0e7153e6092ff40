//! Deploy and delete workflows against the private registry.
//!
//! Both workflows are straight-line sequences of registry calls. Nothing is
//! rolled back: a failure part-way leaves the registry in whatever state the
//! last successful call produced. Neither workflow returns an error; every
//! failure is reported and folded into an [`Outcome`].

mod verify;

pub use verify::{
    DEFAULT_MAX_WAIT, DEFAULT_SETTLE_DELAY, MAX_ATTEMPTS, MIN_BACKOFF_BASE, Verification,
    VerifyPolicy,
};

use crate::archive::create_archive;
use crate::cli::OutputManager;
use crate::error::{DeployError, Result};
use crate::metadata::{ModuleDescriptor, ModuleId};
use crate::registry::{ApiError, RegistryApi};
use std::path::Path;

/// Why a workflow did not succeed
#[derive(Debug)]
pub enum FailureReason {
    /// The version record could not be created, so nothing was uploaded
    VersionNotCreated(ApiError),
    /// The upload finished but the version never showed up on lookup
    NotVisible {
        /// Version that was deployed
        version: String,
        /// Verification lookups performed
        attempts: u32,
    },
    /// The module delete call failed
    ModuleNotDeleted(ApiError),
}

impl FailureReason {
    /// Registry error behind this failure, if there was one
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            FailureReason::VersionNotCreated(e) | FailureReason::ModuleNotDeleted(e) => Some(e),
            FailureReason::NotVisible { .. } => None,
        }
    }

    /// Actionable hints for the user
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            FailureReason::NotVisible { .. } => vec![
                "The registry may still be processing the upload; retry with --verify-attempts"
                    .to_string(),
            ],
            _ => self
                .api_error()
                .map(ApiError::recovery_suggestions)
                .unwrap_or_default(),
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::VersionNotCreated(e) => write!(f, "version was not created: {e}"),
            FailureReason::NotVisible { version, attempts } => write!(
                f,
                "v{version} not visible in the registry after {attempts} lookup(s)"
            ),
            FailureReason::ModuleNotDeleted(e) => write!(f, "module was not deleted: {e}"),
        }
    }
}

/// Terminal state of a deploy or delete run
#[derive(Debug)]
pub enum Outcome {
    /// Workflow completed and, for deploys, the version was verified
    Success,
    /// Expected failure derived from the registry's answers
    Failed(FailureReason),
    /// Anything else (I/O, archiving)
    Unknown(DeployError),
}

impl Outcome {
    /// Whether the workflow succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    /// Process exit code for this outcome
    pub fn exit_code(&self) -> i32 {
        if self.is_success() { 0 } else { 1 }
    }
}

/// Runs deploy and delete workflows through a [`RegistryApi`]
pub struct Deployer<C> {
    client: C,
    output: OutputManager,
    verify: VerifyPolicy,
}

impl<C: RegistryApi> Deployer<C> {
    /// Create a deployer
    pub fn new(client: C, output: OutputManager, verify: VerifyPolicy) -> Self {
        Self {
            client,
            output,
            verify,
        }
    }

    /// The registry client in use
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Publish `descriptor.version`, replacing any existing record of it
    pub async fn deploy(&self, descriptor: &ModuleDescriptor, source_dir: &Path) -> Outcome {
        let outcome = match self.try_deploy(descriptor, source_dir).await {
            Ok(outcome) => outcome,
            Err(e) => Outcome::Unknown(e),
        };

        match &outcome {
            Outcome::Success => self
                .output
                .success(&format!("Successfully deployed v{}", descriptor.version)),
            Outcome::Failed(reason) => {
                self.output
                    .failure(&format!("Failed to deploy v{}", descriptor.version));
                self.output.detail(&reason.to_string());
                self.output.suggestions(&reason.recovery_suggestions());
            }
            Outcome::Unknown(e) => self.report_unknown(e),
        }
        outcome
    }

    /// Remove the module; the registry drops its versions with it
    pub async fn delete(&self, descriptor: &ModuleDescriptor) -> Outcome {
        let id = descriptor.module_id();
        match self.client.delete_module(&id).await {
            Ok(()) => {
                self.output.success(&format!("Deleted module {id}"));
                Outcome::Success
            }
            Err(e) => {
                let reason = FailureReason::ModuleNotDeleted(e);
                self.output.failure(&format!("Failed to delete module {id}"));
                self.output.detail(&reason.to_string());
                self.output.suggestions(&reason.recovery_suggestions());
                Outcome::Failed(reason)
            }
        }
    }

    async fn try_deploy(
        &self,
        descriptor: &ModuleDescriptor,
        source_dir: &Path,
    ) -> Result<Outcome> {
        let id = descriptor.module_id();
        let version = descriptor.version.as_str();

        // 1. Make sure the module exists. A failed create is not fatal: every
        //    later call is keyed by the descriptor, not by this response.
        if !self.module_exists(&id).await {
            match self.client.create_module(&id).await {
                Ok(module) => {
                    log::debug!("Created module {:?}", module);
                    self.output.success("Created module");
                }
                Err(e) => {
                    self.output.failure("Failed to create module");
                    self.output.detail(&e.to_string());
                }
            }
        }

        // 2. Clear any previous record of this version.
        if self.version_exists(&id, version).await {
            match self.client.delete_module_version(&id, version).await {
                Ok(()) => self.output.success(&format!("Deleted previous v{version}")),
                Err(e) => {
                    self.output.failure(&format!("Failed to delete v{version}"));
                    self.output.detail(&e.to_string());
                }
            }
        }

        // 3. Create the version record and take its upload URL.
        let created = match self.client.create_module_version(&id, version).await {
            Ok(created) => created,
            Err(e) => {
                self.output.failure(&format!("Failed to create v{version}"));
                self.output.detail(&e.to_string());
                return Ok(Outcome::Failed(FailureReason::VersionNotCreated(e)));
            }
        };
        let Some(upload_url) = created.upload_url else {
            let e = ApiError::MissingUploadLink {
                version: version.to_string(),
            };
            self.output.failure(&format!("Failed to create v{version}"));
            self.output.detail(&e.to_string());
            return Ok(Outcome::Failed(FailureReason::VersionNotCreated(e)));
        };
        self.output.success(&format!("Created v{version}"));

        // 4. Package the module directory.
        let archive = create_archive(source_dir).await?;
        self.output
            .verbose(&format!("Packaged {} ({} bytes)", source_dir.display(), archive.len()));

        // 5. Upload. A failed upload still falls through to verification.
        match self.client.upload_archive(&upload_url, archive).await {
            Ok(()) => self.output.success("Uploaded package"),
            Err(e) => {
                self.output.failure("Failed to upload package");
                self.output.detail(&e.to_string());
            }
        }

        // 6 + 7. Give the registry time to ingest, then look again.
        let verification = self
            .verify
            .wait_until(|| self.version_exists(&id, version))
            .await;
        log::debug!("Verification finished: {:?}", verification);

        if verification.visible {
            Ok(Outcome::Success)
        } else {
            Ok(Outcome::Failed(FailureReason::NotVisible {
                version: version.to_string(),
                attempts: verification.attempts,
            }))
        }
    }

    /// Lookup that treats errors as "absent" after reporting them
    async fn module_exists(&self, id: &ModuleId) -> bool {
        match self.client.lookup_module(id).await {
            Ok(Some(_)) => {
                self.output.lookup(&format!("Module {id} found"));
                true
            }
            Ok(None) => {
                self.output.lookup(&format!("Module {id} not found"));
                false
            }
            Err(e) => {
                self.output.warn(&format!("Module lookup failed: {e}"));
                false
            }
        }
    }

    async fn version_exists(&self, id: &ModuleId, version: &str) -> bool {
        match self.client.lookup_module_version(id, version).await {
            Ok(Some(_)) => {
                self.output.lookup(&format!("Found v{version}"));
                true
            }
            Ok(None) => {
                self.output.lookup(&format!("Could not find v{version}"));
                false
            }
            Err(e) => {
                self.output.warn(&format!("Lookup of v{version} failed: {e}"));
                false
            }
        }
    }

    fn report_unknown(&self, error: &DeployError) {
        self.output.alert("An unknown error occurred");
        self.output.detail(&error.to_string());
        self.output.suggestions(&error.recovery_suggestions());
    }
}
