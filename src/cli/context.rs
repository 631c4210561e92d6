use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use change_detector::ChangeDetector;
use rule_translator::{Translator, TranslatorOptions};
use scenario_parser::{determine_workflow, ScenarioDocument, ScenarioParser};
use step_executor::{
    DryRunSessionProvider, ExecutorOptions, HttpSessionConfig, HttpSessionProvider, RunReport,
    ScenarioRunner, SessionProvider, StepExecutor,
};
use text_tester_core_types::ProcessEnv;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::output::OutputFormat;
use crate::config::AppSettings;

pub struct CliContext {
    settings: AppSettings,
    output: OutputFormat,
}

impl CliContext {
    pub fn new(settings: AppSettings, output: OutputFormat) -> Self {
        Self { settings, output }
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn output(&self) -> OutputFormat {
        self.output
    }

    pub fn translator(&self) -> Arc<Translator> {
        let mut options = TranslatorOptions::from_config_dir(&self.settings.config_dir)
            .with_env(Arc::new(ProcessEnv));
        if let Some(strict) = self.settings.strict_override {
            options = options.with_strict_mode(strict);
        }
        Arc::new(Translator::load(options))
    }

    pub fn parser(&self) -> ScenarioParser {
        ScenarioParser::new(Arc::new(ProcessEnv))
    }

    pub fn detector(&self) -> ChangeDetector {
        ChangeDetector::new(&self.settings.scenarios_dir, &self.settings.cache_file)
    }

    /// HTTP sessions when an endpoint is configured, otherwise a dry run.
    pub fn session_provider(&self, dry_run: bool) -> Result<Arc<dyn SessionProvider>> {
        let endpoint = self.settings.execution.session_endpoint.as_deref();
        match endpoint {
            Some(endpoint) if !dry_run => {
                let mut config = HttpSessionConfig::new(endpoint);
                if let Some(timeout) = self.settings.execution.step_timeout() {
                    config = config.with_request_timeout(timeout);
                }
                let provider =
                    HttpSessionProvider::new(config).context("failed to set up session client")?;
                info!(endpoint, "using automation endpoint");
                Ok(Arc::new(provider))
            }
            _ => {
                if !dry_run {
                    warn!("no session endpoint configured; running steps dry");
                }
                Ok(Arc::new(DryRunSessionProvider))
            }
        }
    }

    pub fn runner(&self, dry_run: bool, cancel: CancellationToken) -> Result<ScenarioRunner> {
        let mut options = ExecutorOptions::default();
        if let Some(timeout) = self.settings.execution.step_timeout() {
            options = options.with_step_timeout(timeout);
        }
        let executor = StepExecutor::new(self.translator(), self.session_provider(dry_run)?, options);
        Ok(ScenarioRunner::new(executor).with_cancellation(cancel))
    }

    /// Resolves the workflow (creating its cache directory) and parses the file.
    pub fn load_scenario(&self, path: &Path) -> Result<ScenarioDocument> {
        let workflow = determine_workflow(path, &self.settings.execution.cache_dir)?;
        let document = self.parser().parse_file(path, workflow)?;
        if document.cases.is_empty() {
            warn!(path = %path.display(), "scenario has no test cases");
        }
        Ok(document)
    }
}

/// Runs each file in order with one runner, stopping early on cancellation.
pub async fn run_files(
    runner: &mut ScenarioRunner,
    ctx: &CliContext,
    files: &[PathBuf],
    cancel: &CancellationToken,
) -> Result<Vec<(PathBuf, RunReport)>> {
    let mut reports = Vec::with_capacity(files.len());
    for file in files {
        if cancel.is_cancelled() {
            break;
        }
        let document = ctx.load_scenario(file)?;
        let report = runner.run_document(&document).await;
        reports.push((file.clone(), report));
    }
    Ok(reports)
}
