use anyhow::Result;
use serde::Serialize;

use super::context::CliContext;
use super::output::{print_structured, OutputFormat};

#[derive(Serialize)]
struct Info {
    version: &'static str,
    build_date: &'static str,
    git_hash: &'static str,
    config_dir: String,
    scenarios_dir: String,
    scenarios: usize,
    rules: usize,
    config_issues: usize,
    strict: bool,
    session_endpoint: Option<String>,
}

pub async fn cmd_info(ctx: &CliContext) -> Result<bool> {
    let settings = ctx.settings();
    let translator = ctx.translator();
    let scenarios = ctx.detector().scenario_files().map(|f| f.len()).unwrap_or(0);
    let info = Info {
        version: env!("CARGO_PKG_VERSION"),
        build_date: option_env!("BUILD_DATE").unwrap_or("unknown"),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown"),
        config_dir: settings.config_dir.display().to_string(),
        scenarios_dir: settings.scenarios_dir.display().to_string(),
        scenarios,
        rules: translator.rule_count(),
        config_issues: translator.issues().len(),
        strict: translator.is_strict(),
        session_endpoint: settings.execution.session_endpoint.clone(),
    };

    if ctx.output() != OutputFormat::Human {
        print_structured(&info, ctx.output())?;
        return Ok(true);
    }
    println!("Text Tester System Information");
    println!("==============================");
    println!("Version:          {}", info.version);
    println!("Build date:       {}", info.build_date);
    println!("Git commit:       {}", info.git_hash);
    println!("Config directory: {}", info.config_dir);
    println!("Rules loaded:     {} ({} issues)", info.rules, info.config_issues);
    println!("Strict mode:      {}", info.strict);
    println!("Scenarios:        {} in {}", info.scenarios, info.scenarios_dir);
    println!(
        "Session endpoint: {}",
        info.session_endpoint.as_deref().unwrap_or("none (dry run)")
    );
    Ok(true)
}
