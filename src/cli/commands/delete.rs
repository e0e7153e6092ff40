//! `tfm delete`: remove the current module from the registry.

use super::helpers::resolve_target;
use crate::cli::{Args, RuntimeConfig};
use crate::deploy::Deployer;
use crate::error::Result;
use crate::registry::RegistryClient;

/// Execute delete command
pub(super) async fn execute_delete(args: &Args, config: &RuntimeConfig) -> Result<i32> {
    let target = resolve_target(args)?;

    config
        .output()
        .section(&format!("Deleting {}", target.descriptor.module_id()));

    let client = RegistryClient::new(&target.config)?;
    let deployer = Deployer::new(client, config.output().clone(), args.verify_policy());
    let outcome = deployer.delete(&target.descriptor).await;

    Ok(outcome.exit_code())
}
