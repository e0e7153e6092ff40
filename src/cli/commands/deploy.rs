//! `tfm deploy`: publish the manifest version of the current module.

use super::helpers::resolve_target;
use crate::cli::{Args, RuntimeConfig};
use crate::deploy::Deployer;
use crate::error::Result;
use crate::registry::RegistryClient;

/// Execute deploy command
pub(super) async fn execute_deploy(args: &Args, config: &RuntimeConfig) -> Result<i32> {
    let target = resolve_target(args)?;
    let descriptor = &target.descriptor;

    config.output().section(&format!(
        "Deploying {}/{}/{} v{}",
        descriptor.organization, descriptor.name, descriptor.provider, descriptor.version
    ));

    let client = RegistryClient::new(&target.config)?;
    let deployer = Deployer::new(client, config.output().clone(), args.verify_policy());
    let outcome = deployer.deploy(descriptor, &target.dir).await;

    Ok(outcome.exit_code())
}
