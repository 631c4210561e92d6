use super::changed::cmd_changed;
use super::config::cmd_config;
use super::env::CliArgs;
use super::info::cmd_info;
use super::parse::cmd_parse;
use super::run::cmd_run;
use super::translate::cmd_translate;
use super::watch::cmd_watch;
use crate::cli::commands::Commands;
use crate::cli::context::CliContext;
use anyhow::Result;

/// Runs the selected command; `Ok(false)` means the command completed but
/// reported failures (failed cases, invalid configuration).
pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<bool> {
    match cli.command.clone() {
        Commands::Run(args) => cmd_run(args, ctx).await,
        Commands::Changed(args) => cmd_changed(args, ctx).await,
        Commands::Translate(args) => cmd_translate(args, ctx).await,
        Commands::Parse(args) => cmd_parse(args, ctx).await,
        Commands::Watch(args) => cmd_watch(args, ctx).await,
        Commands::Config(args) => cmd_config(args, ctx).await,
        Commands::Info => cmd_info(ctx).await,
    }
}
