use anyhow::Result;
use clap::Parser;
use tracing::{debug, error};

use super::context::CliContext;
use super::dispatch::dispatch;
use super::env::CliArgs;
use super::runtime::init_logging;
use crate::config::AppSettings;
use text_tester_core_types::ProcessEnv;

pub async fn run() -> Result<bool> {
    let cli = CliArgs::parse();

    init_logging(&cli.log_level, cli.debug, cli.log_format)?;
    debug!("Starting text-tester v{}", env!("CARGO_PKG_VERSION"));

    let settings = AppSettings::resolve(
        cli.config_dir.as_deref(),
        cli.scenarios_dir.as_deref(),
        cli.cache_file.as_deref(),
        &ProcessEnv,
    )?;
    let ctx = CliContext::new(settings, cli.output);

    match dispatch(&cli, &ctx).await {
        Ok(passed) => {
            debug!(passed, "Command completed");
            Ok(passed)
        }
        Err(err) => {
            error!("Command failed: {:#}", err);
            Err(err)
        }
    }
}
