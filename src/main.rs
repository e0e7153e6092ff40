//! tfm - publish modules to a private Terraform registry.
//!
//! Exit code 0 means the command succeeded (for deploys: the new version was
//! seen on the registry); anything else exits with 1.

use std::process;
use tfm_deploy::cli;
use tfm_deploy::cli::OutputManager;

#[tokio::main]
async fn main() {
    let args = cli::parse_args();

    let default_filter = if args.debug {
        "warn,tfm_deploy=debug"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match cli::run(args).await {
        Ok(exit_code) => {
            process::exit(exit_code);
        }
        Err(e) => {
            // Never quiet for fatal errors
            let output = OutputManager::new(false, false);
            output.error(&format!("Fatal error: {e}"));

            output.suggestions(&e.recovery_suggestions());

            process::exit(1);
        }
    }
}
