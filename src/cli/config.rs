use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use rule_translator::{validate_config_dir, ConfigIssue, SegmentDelimiter};
use serde::Serialize;
use tracing::info;

use super::context::CliContext;
use super::output::{print_structured, OutputFormat};
use crate::config::ExecutionConfig;

#[derive(Args, Clone, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ConfigAction {
    /// Show the resolved configuration and loaded rules
    View,

    /// Validate core.yaml and translation-rules.yaml, reporting every problem
    Validate,
}

#[derive(Serialize)]
struct ConfigView<'a> {
    config_dir: &'a PathBuf,
    scenarios_dir: &'a PathBuf,
    cache_file: &'a PathBuf,
    execution: &'a ExecutionConfig,
    delimiter: SegmentDelimiter,
    strict: bool,
    param_patterns: Vec<(String, String)>,
    rules: Vec<RuleView>,
    issues: Vec<ConfigIssue>,
}

#[derive(Serialize)]
struct RuleView {
    name: String,
    patterns: Vec<String>,
    template: String,
}

pub async fn cmd_config(args: ConfigArgs, ctx: &CliContext) -> Result<bool> {
    match args.action {
        ConfigAction::View => {
            let translator = ctx.translator();
            let book = translator.snapshot();
            let settings = ctx.settings();
            let view = ConfigView {
                config_dir: &settings.config_dir,
                scenarios_dir: &settings.scenarios_dir,
                cache_file: &settings.cache_file,
                execution: &settings.execution,
                delimiter: book.delimiter,
                strict: book.strict,
                param_patterns: book
                    .library
                    .iter()
                    .map(|(name, fragment)| (name.to_string(), fragment.to_string()))
                    .collect(),
                rules: book
                    .rules
                    .rules()
                    .map(|rule| RuleView {
                        name: rule.name.clone(),
                        patterns: rule.patterns.iter().map(|p| p.0.clone()).collect(),
                        template: rule.template.clone(),
                    })
                    .collect(),
                issues: book.issues.clone(),
            };
            let format = match ctx.output() {
                OutputFormat::Human => OutputFormat::Yaml,
                other => other,
            };
            print_structured(&view, format)?;
            Ok(true)
        }
        ConfigAction::Validate => {
            let dir = &ctx.settings().config_dir;
            match validate_config_dir(dir) {
                Ok(rules) => {
                    info!(rules, "configuration valid");
                    println!("Configuration in {} is valid ({rules} rules)", dir.display());
                    Ok(true)
                }
                Err(err) => {
                    let issues = err.issues();
                    if ctx.output() == OutputFormat::Human {
                        println!(
                            "Configuration in {} has {} problem(s):",
                            dir.display(),
                            issues.len()
                        );
                        for issue in &issues {
                            println!("  - {issue}");
                        }
                    } else {
                        print_structured(&issues, ctx.output())?;
                    }
                    Ok(false)
                }
            }
        }
    }
}
