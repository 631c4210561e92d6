use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use step_executor::RunReport;
use tracing::info;

use super::context::{run_files, CliContext};
use super::output::{print_structured, OutputFormat};
use super::runtime::ctrl_c_token;

#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// Scenario files to run (defaults to every scenario in the scenarios directory)
    pub files: Vec<PathBuf>,

    /// Log steps instead of sending them to the automation endpoint
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn cmd_run(args: RunArgs, ctx: &CliContext) -> Result<bool> {
    let files = if args.files.is_empty() {
        ctx.detector()
            .scenario_files()
            .context("failed to list scenarios")?
    } else {
        args.files
    };
    if files.is_empty() {
        println!(
            "No scenarios found in {}",
            ctx.settings().scenarios_dir.display()
        );
        return Ok(true);
    }

    let cancel = ctrl_c_token();
    let mut runner = ctx.runner(args.dry_run, cancel.clone())?;
    let reports = run_files(&mut runner, ctx, &files, &cancel).await?;
    report_runs(&reports, ctx.output())?;
    Ok(all_passed(&reports) && reports.len() == files.len())
}

pub fn all_passed(reports: &[(PathBuf, RunReport)]) -> bool {
    reports.iter().all(|(_, report)| report.passed())
}

#[derive(Serialize)]
struct FileReport<'a> {
    file: &'a PathBuf,
    #[serde(flatten)]
    report: &'a RunReport,
}

pub fn report_runs(reports: &[(PathBuf, RunReport)], format: OutputFormat) -> Result<()> {
    if format != OutputFormat::Human {
        let payload: Vec<FileReport<'_>> = reports
            .iter()
            .map(|(file, report)| FileReport { file, report })
            .collect();
        return print_structured(&payload, format);
    }

    let mut passed = 0usize;
    let mut failed = 0usize;
    let mut steps = 0usize;
    for (file, report) in reports {
        println!("{} ({})", file.display(), report.workflow);
        for case in &report.cases {
            let marker = if case.passed { "PASS" } else { "FAIL" };
            println!(
                "  {marker} {} ({} steps, {}ms)",
                case.name,
                case.steps.len(),
                case.duration_ms
            );
            if let (Some(index), Some(error)) = (case.failed_step(), case.error.as_deref()) {
                println!("       step {}: {}", index + 1, case.steps[index].outcome.action);
                for line in error.lines() {
                    println!("       {line}");
                }
            } else if let Some(error) = case.error.as_deref() {
                println!("       {error}");
            }
        }
        if report.cancelled {
            println!("  run cancelled");
        }
        passed += report.stats.passed;
        failed += report.stats.failed;
        steps += report.stats.steps_run;
    }
    println!("Summary: {passed} passed, {failed} failed, {steps} steps");
    info!(passed, failed, steps, "run complete");
    Ok(())
}
