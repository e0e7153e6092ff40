//! `tfm inspect`: show what deploy/delete would act on.
//!
//! Never contacts the registry, so a token is reported but not required.

use crate::cli::{Args, RuntimeConfig};
use crate::config::RegistryTarget;
use crate::error::Result;
use crate::metadata::load_descriptor;

/// Execute inspect command
pub(super) fn execute_inspect(args: &Args, config: &RuntimeConfig) -> Result<i32> {
    let target = RegistryTarget::resolve(args.config_overrides())?;
    let dir = args.module_dir()?;
    let descriptor = load_descriptor(&dir, &target.organization)?;
    let output = config.output();

    output.section("Module");
    output.indent(&format!("Package:      {}", descriptor.package));
    output.indent(&format!("Provider:     {}", descriptor.provider));
    output.indent(&format!("Name:         {}", descriptor.name));
    output.indent(&format!("Version:      {}", descriptor.version));
    output.indent(&format!("Directory:    {}", dir.display()));

    output.section("Registry");
    output.indent(&format!("Organization: {}", target.organization));
    output.indent(&format!("Host:         {}", target.host));
    output.indent(&format!("Lookup API:   {}", target.lookup_base()));
    output.indent(&format!("Manage API:   {}", target.management_base()));
    let token = if target.has_token {
        "configured"
    } else {
        "not configured"
    };
    output.indent(&format!("Token:        {token}"));

    Ok(0)
}
