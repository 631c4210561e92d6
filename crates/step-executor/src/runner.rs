use std::time::Instant;

use scenario_parser::{ScenarioDocument, TestCase};
use text_tester_core_types::{RunId, WorkflowId};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::executor::StepExecutor;
use crate::model::{CaseReport, RunReport, RunStats, StepReport};

/// Runs parsed scenarios case by case. A case halts at its first failing
/// step; later cases still run. Cancellation is checked between steps.
pub struct ScenarioRunner {
    executor: StepExecutor,
    cancel: CancellationToken,
}

impl ScenarioRunner {
    pub fn new(executor: StepExecutor) -> Self {
        Self {
            executor,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn executor(&self) -> &StepExecutor {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut StepExecutor {
        &mut self.executor
    }

    pub async fn run_document(&mut self, document: &ScenarioDocument) -> RunReport {
        let run_id = RunId::new();
        let stats = document.stats();
        info!(
            run_id = %run_id,
            workflow = %document.workflow,
            cases = stats.cases,
            steps = stats.steps,
            multiline = stats.multiline_steps,
            "running scenario"
        );

        let mut cases = Vec::with_capacity(document.cases.len());
        let mut cancelled = false;
        for case in &document.cases {
            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            let report = self.run_case(case, &document.workflow).await;
            cases.push(report);
        }
        cancelled |= self.cancel.is_cancelled();

        let stats = tally(&cases);
        info!(
            run_id = %run_id,
            passed = stats.passed,
            failed = stats.failed,
            cancelled,
            "scenario finished"
        );
        RunReport {
            run_id,
            workflow: document.workflow.clone(),
            cases,
            stats,
            cancelled,
        }
    }

    pub async fn run_case(&mut self, case: &TestCase, workflow: &WorkflowId) -> CaseReport {
        info!(case = %case.name, steps = case.steps.len(), "case started");
        let started = Instant::now();
        let mut steps = Vec::with_capacity(case.steps.len());
        let mut error = None;

        for (index, step) in case.steps.iter().enumerate() {
            if self.cancel.is_cancelled() {
                error = Some(format!("cancelled before step {}", index + 1));
                break;
            }
            let outcome = self.executor.execute_parsed_step(&step.action, workflow).await;
            let failed = !outcome.success;
            if failed {
                error = outcome.error.clone();
            }
            steps.push(StepReport {
                comment: step.comment.clone(),
                is_multiline: step.is_multiline,
                outcome,
            });
            if failed {
                warn!(
                    case = %case.name,
                    step = index + 1,
                    remaining = case.steps.len() - index - 1,
                    "case halted"
                );
                break;
            }
        }

        let passed = error.is_none();
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(case = %case.name, passed, duration_ms, "case finished");
        CaseReport {
            name: case.name.clone(),
            comments: case.comments.clone(),
            multiline_steps: steps.iter().filter(|step| step.is_multiline).count(),
            steps,
            passed,
            error,
            duration_ms,
        }
    }
}

fn tally(cases: &[CaseReport]) -> RunStats {
    let passed = cases.iter().filter(|case| case.passed).count();
    RunStats {
        cases: cases.len(),
        passed,
        failed: cases.len() - passed,
        steps_run: cases.iter().map(|case| case.steps.len()).sum(),
        multiline_steps: cases.iter().map(|case| case.multiline_steps).sum(),
    }
}
