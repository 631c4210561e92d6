use chrono::{DateTime, Utc};
use rule_translator::Translation;
use serde::Serialize;
use serde_json::Value;
use text_tester_core_types::{ActionType, RunId, WorkflowId};

/// A step resolved against the current rule set but not yet executed.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CompiledStep {
    /// Step text as written in the scenario.
    pub action: String,
    pub translation: Translation,
    pub workflow: WorkflowId,
}

impl CompiledStep {
    pub fn action_type(&self) -> ActionType {
        self.translation.action_type()
    }

    /// What will be sent to the session.
    pub fn code(&self) -> &str {
        self.translation.code()
    }

    pub fn engine(&self) -> &'static str {
        self.translation.engine()
    }
}

/// Result of one executed step. Failures are data: `error` carries the
/// diagnostic, enriched with rule context when a rule produced the code.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StepOutcome {
    pub success: bool,
    pub action: String,
    /// `None` when the step failed before a translation existed.
    #[serde(rename = "type")]
    pub action_type: Option<ActionType>,
    pub code: Option<String>,
    pub result: Option<Value>,
    pub summary: Option<String>,
    pub error: Option<String>,
    pub duration_ms: u64,
    pub workflow: WorkflowId,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExecutionRecord {
    pub action: String,
    #[serde(rename = "type")]
    pub action_type: Option<ActionType>,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub workflow: WorkflowId,
    pub timestamp: DateTime<Utc>,
}

impl ExecutionRecord {
    pub fn from_outcome(outcome: &StepOutcome) -> Self {
        Self {
            action: outcome.action.clone(),
            action_type: outcome.action_type,
            success: outcome.success,
            duration_ms: outcome.duration_ms,
            error: outcome.error.clone(),
            workflow: outcome.workflow.clone(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StepReport {
    pub comment: Option<String>,
    pub is_multiline: bool,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CaseReport {
    pub name: String,
    pub comments: Vec<String>,
    pub steps: Vec<StepReport>,
    pub passed: bool,
    pub error: Option<String>,
    pub duration_ms: u64,
    pub multiline_steps: usize,
}

impl CaseReport {
    /// Index of the step that halted the case.
    pub fn failed_step(&self) -> Option<usize> {
        self.steps.iter().position(|step| !step.outcome.success)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub cases: usize,
    pub passed: usize,
    pub failed: usize,
    pub steps_run: usize,
    pub multiline_steps: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub workflow: WorkflowId,
    pub cases: Vec<CaseReport>,
    pub stats: RunStats,
    pub cancelled: bool,
}

impl RunReport {
    pub fn passed(&self) -> bool {
        !self.cancelled && self.cases.iter().all(|case| case.passed)
    }
}
