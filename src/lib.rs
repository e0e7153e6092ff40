//! # tfm_deploy
//!
//! Publish and remove versioned modules in a private Terraform module
//! registry (Terraform Cloud or Terraform Enterprise).
//!
//! The module's coordinates come from `package.json`: a package named
//! `tfm-aws-vpc` at version `1.2.0` becomes module `vpc` for provider `aws`,
//! version `1.2.0`, in the configured organization.
//!
//! ## Deploy workflow
//!
//! 1. Look up the module and register it if it is missing
//! 2. Delete any existing record of the target version
//! 3. Create the version record and take its upload URL
//! 4. Package the module directory as a gzip tarball
//! 5. Upload the tarball
//! 6. Wait for the registry to ingest it and look the version up again
//!
//! ## Usage
//!
//! ```bash
//! tfm deploy                       # publish the version in package.json
//! tfm delete                       # remove the module
//! TFMDIR=modules/vpc tfm inspect   # show what would be published
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod archive;
pub mod cli;
pub mod config;
pub mod deploy;
pub mod error;
pub mod metadata;
pub mod registry;

pub use archive::create_archive;
pub use config::{RegistryConfig, RegistryTarget};
pub use deploy::{Deployer, FailureReason, Outcome, VerifyPolicy};
pub use error::{DeployError, Result};
pub use metadata::{ModuleDescriptor, ModuleId, load_descriptor};
pub use registry::{ApiError, ApiResult, RegistryApi, RegistryClient};
