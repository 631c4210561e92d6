use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use change_detector::{MonitorOptions, ScenarioMonitor};
use clap::Args;
use tokio::sync::Mutex;
use tracing::{error, info};

use super::context::{run_files, CliContext};
use super::run::{all_passed, report_runs};
use super::runtime::ctrl_c_token;

#[derive(Args, Clone, Debug)]
pub struct WatchArgs {
    /// Polling interval in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub poll_ms: u64,

    /// Quiet period after a change before running, in milliseconds
    #[arg(long, default_value_t = 500)]
    pub debounce_ms: u64,

    /// Log steps instead of sending them to the automation endpoint
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn cmd_watch(args: WatchArgs, ctx: &CliContext) -> Result<bool> {
    let cancel = ctrl_c_token();
    let runner = Arc::new(Mutex::new(ctx.runner(args.dry_run, cancel.clone())?));
    let monitor = ScenarioMonitor::new(
        ctx.detector(),
        MonitorOptions {
            poll_interval: Duration::from_millis(args.poll_ms.max(1)),
            debounce: Duration::from_millis(args.debounce_ms),
        },
    );
    println!(
        "Watching {} (Ctrl-C to stop)",
        ctx.settings().scenarios_dir.display()
    );

    let output = ctx.output();
    let run_cancel = cancel.clone();
    monitor
        .run(cancel, move |batch| {
            let runner = Arc::clone(&runner);
            let cancel = run_cancel.clone();
            async move {
                let files: Vec<_> = batch.into_iter().map(|change| change.file).collect();
                info!(files = files.len(), "scenarios changed");
                let mut runner = runner.lock().await;
                match run_files(&mut runner, ctx, &files, &cancel).await {
                    Ok(reports) => {
                        if let Err(err) = report_runs(&reports, output) {
                            error!("failed to print report: {:#}", err);
                        }
                        reports.len() == files.len() && all_passed(&reports)
                    }
                    Err(err) => {
                        error!("watch run failed: {:#}", err);
                        false
                    }
                }
            }
        })
        .await
        .context("scenario watch failed")?;
    Ok(true)
}
