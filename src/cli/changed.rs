use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use super::context::{run_files, CliContext};
use super::output::{print_structured, OutputFormat};
use super::run::report_runs;
use super::runtime::ctrl_c_token;

#[derive(Args, Clone, Debug)]
pub struct ChangedArgs {
    /// Run the changed scenarios and record the ones that pass
    #[arg(long)]
    pub run: bool,

    /// Log steps instead of sending them to the automation endpoint
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn cmd_changed(args: ChangedArgs, ctx: &CliContext) -> Result<bool> {
    let mut detector = ctx.detector();
    let changes = detector
        .get_changed_tests()
        .context("failed to scan scenarios")?;

    if !args.run {
        match ctx.output() {
            OutputFormat::Human if changes.is_empty() => println!("No changed scenarios"),
            OutputFormat::Human => {
                for change in &changes {
                    println!("{}", change.file.display());
                }
            }
            format => print_structured(&changes, format)?,
        }
        return Ok(true);
    }

    if changes.is_empty() {
        println!("No changed scenarios");
        return Ok(true);
    }
    let files: Vec<PathBuf> = changes.into_iter().map(|change| change.file).collect();
    let cancel = ctrl_c_token();
    let mut runner = ctx.runner(args.dry_run, cancel.clone())?;
    let reports = run_files(&mut runner, ctx, &files, &cancel).await?;
    report_runs(&reports, ctx.output())?;

    let passed: Vec<PathBuf> = reports
        .iter()
        .filter(|(_, report)| report.passed())
        .map(|(file, _)| file.clone())
        .collect();
    detector
        .mark_run(&passed)
        .context("failed to update change cache")?;
    info!(marked = passed.len(), "recorded passing scenarios");
    Ok(passed.len() == files.len())
}
