use std::sync::Arc;
use std::time::{Duration, Instant};

use rule_translator::{Translation, Translator};
use serde_json::Value;
use text_tester_core_types::{ActionType, WorkflowId};
use tracing::{debug, info, warn};

use crate::errors::ExecutorError;
use crate::model::{CompiledStep, ExecutionRecord, StepOutcome};
use crate::ports::SessionProvider;
use crate::shallow::summarize_result;

#[derive(Clone, Debug, Default)]
pub struct ExecutorOptions {
    /// Wall-clock budget for one session call; `None` waits indefinitely.
    pub step_timeout: Option<Duration>,
}

impl ExecutorOptions {
    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = Some(timeout);
        self
    }
}

/// Compiles, runs and records scenario steps. Owns the execution history
/// for one run.
pub struct StepExecutor {
    translator: Arc<Translator>,
    sessions: Arc<dyn SessionProvider>,
    options: ExecutorOptions,
    history: Vec<ExecutionRecord>,
}

impl StepExecutor {
    pub fn new(
        translator: Arc<Translator>,
        sessions: Arc<dyn SessionProvider>,
        options: ExecutorOptions,
    ) -> Self {
        Self {
            translator,
            sessions,
            options,
            history: Vec::new(),
        }
    }

    pub fn translator(&self) -> &Arc<Translator> {
        &self.translator
    }

    pub fn history(&self) -> &[ExecutionRecord] {
        &self.history
    }

    pub fn take_history(&mut self) -> Vec<ExecutionRecord> {
        std::mem::take(&mut self.history)
    }

    /// Resolves `action` without touching the session.
    pub fn compile_step(
        &self,
        action: &str,
        workflow: &WorkflowId,
    ) -> Result<CompiledStep, ExecutorError> {
        let translation = self.translator.translate(action)?;
        Ok(self.compiled(action, translation, workflow))
    }

    /// Like [`StepExecutor::compile_step`] for parsed steps, whose `%NAME%`
    /// placeholders the parser already expanded.
    pub fn compile_parsed_step(
        &self,
        action: &str,
        workflow: &WorkflowId,
    ) -> Result<CompiledStep, ExecutorError> {
        let translation = self.translator.translate_expanded(action)?;
        Ok(self.compiled(action, translation, workflow))
    }

    fn compiled(
        &self,
        action: &str,
        translation: Translation,
        workflow: &WorkflowId,
    ) -> CompiledStep {
        debug!(
            action,
            engine = translation.engine(),
            code = translation.code(),
            "compiled step"
        );
        CompiledStep {
            action: action.to_string(),
            translation,
            workflow: workflow.clone(),
        }
    }

    /// Runs a compiled step and appends it to the history. Never fails:
    /// session errors are returned inside the outcome.
    pub async fn execute_compiled_step(&mut self, step: &CompiledStep) -> StepOutcome {
        let started = Instant::now();
        let result = self.dispatch(step).await;
        let duration_ms = elapsed_ms(started);

        let outcome = match result {
            Ok(value) => StepOutcome {
                success: true,
                action: step.action.clone(),
                action_type: Some(step.action_type()),
                code: Some(step.code().to_string()),
                summary: Some(summarize_result(&value)),
                result: Some(value),
                error: None,
                duration_ms,
                workflow: step.workflow.clone(),
            },
            Err(err) => {
                let message = enrich_error(&err, &step.translation);
                warn!(
                    action = %step.action,
                    workflow = %step.workflow,
                    duration_ms,
                    error = %err,
                    "step failed"
                );
                StepOutcome {
                    success: false,
                    action: step.action.clone(),
                    action_type: Some(step.action_type()),
                    code: Some(step.code().to_string()),
                    result: None,
                    summary: None,
                    error: Some(message),
                    duration_ms,
                    workflow: step.workflow.clone(),
                }
            }
        };
        self.record(&outcome);
        outcome
    }

    /// Compile, execute and record one step.
    pub async fn execute_step(&mut self, action: &str, workflow: &WorkflowId) -> StepOutcome {
        let started = Instant::now();
        let compiled = self.compile_step(action, workflow);
        self.finish_step(action, workflow, compiled, started).await
    }

    /// [`StepExecutor::execute_step`] for a step produced by the scenario parser.
    pub async fn execute_parsed_step(
        &mut self,
        action: &str,
        workflow: &WorkflowId,
    ) -> StepOutcome {
        let started = Instant::now();
        let compiled = self.compile_parsed_step(action, workflow);
        self.finish_step(action, workflow, compiled, started).await
    }

    async fn finish_step(
        &mut self,
        action: &str,
        workflow: &WorkflowId,
        compiled: Result<CompiledStep, ExecutorError>,
        started: Instant,
    ) -> StepOutcome {
        match compiled {
            Ok(step) => self.execute_compiled_step(&step).await,
            Err(err) => {
                warn!(action, workflow = %workflow, error = %err, "step did not compile");
                let outcome = StepOutcome {
                    success: false,
                    action: action.to_string(),
                    action_type: None,
                    code: None,
                    result: None,
                    summary: None,
                    error: Some(err.to_string()),
                    duration_ms: elapsed_ms(started),
                    workflow: workflow.clone(),
                };
                self.record(&outcome);
                outcome
            }
        }
    }

    async fn dispatch(&self, step: &CompiledStep) -> Result<Value, ExecutorError> {
        let session = self.sessions.session(&step.workflow).await?;
        let code = step.code();
        let call = async {
            match step.action_type() {
                ActionType::Act => session.act(code).await,
                ActionType::Extract => session.extract(code).await,
                ActionType::Agent => session.agent(code).await,
            }
        };
        match self.options.step_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => Ok(result?),
                Err(_) => Err(ExecutorError::Timeout {
                    timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                }),
            },
            None => Ok(call.await?),
        }
    }

    fn record(&mut self, outcome: &StepOutcome) {
        if outcome.success {
            info!(
                action = %outcome.action,
                duration_ms = outcome.duration_ms,
                "step passed"
            );
        }
        self.history.push(ExecutionRecord::from_outcome(outcome));
    }
}

/// Adds the matched rule, pattern, params and generated code to a failure
/// so a bad rule or capture can be diagnosed from the report alone.
fn enrich_error(err: &ExecutorError, translation: &Translation) -> String {
    let Some(rules) = translation.as_rules() else {
        return err.to_string();
    };
    let params = serde_json::to_string(&rules.params).unwrap_or_else(|_| "{}".to_string());
    format!(
        "{err}\n  rule: {}\n  pattern: {}\n  params: {params}\n  code: {}",
        rules.rule, rules.pattern.0, rules.code
    )
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
