//! Shared helper functions for command execution.

use crate::cli::Args;
use crate::config::RegistryConfig;
use crate::error::Result;
use crate::metadata::{ModuleDescriptor, load_descriptor};
use std::path::PathBuf;

/// Everything a command needs to talk about one module
pub(super) struct Target {
    /// Resolved registry connection settings
    pub config: RegistryConfig,
    /// Module coordinates from the manifest
    pub descriptor: ModuleDescriptor,
    /// Module directory
    pub dir: PathBuf,
}

/// Resolve configuration, then read the module manifest
pub(super) fn resolve_target(args: &Args) -> Result<Target> {
    let config = RegistryConfig::resolve(args.config_overrides())?;
    log::debug!("Resolved registry configuration: {:?}", config);

    let dir = args.module_dir()?;
    let descriptor = load_descriptor(&dir, &config.organization)?;
    log::debug!("Module descriptor: {:?}", descriptor);

    Ok(Target {
        config,
        descriptor,
        dir,
    })
}
