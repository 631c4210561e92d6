use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use scenario_parser::{ScenarioDocument, ScenarioStats};
use serde::Serialize;
use text_tester_core_types::WorkflowId;

use super::context::CliContext;
use super::output::{print_structured, OutputFormat};

#[derive(Args, Clone, Debug)]
pub struct ParseArgs {
    /// Scenario file to parse
    pub file: PathBuf,
}

#[derive(Serialize)]
struct ParsedScenario {
    #[serde(flatten)]
    document: ScenarioDocument,
    stats: ScenarioStats,
}

pub async fn cmd_parse(args: ParseArgs, ctx: &CliContext) -> Result<bool> {
    let workflow = WorkflowId::from_scenario_path(&args.file);
    let document = ctx.parser().parse_file(&args.file, workflow)?;
    let parsed = ParsedScenario {
        stats: document.stats(),
        document,
    };
    let format = match ctx.output() {
        OutputFormat::Human => OutputFormat::Json,
        other => other,
    };
    print_structured(&parsed, format)?;
    Ok(true)
}
