//! Step execution: compile a scenario step through the [`Translator`], run
//! it against an [`AutomationSession`], and keep an execution history.
//!
//! [`Translator`]: rule_translator::Translator

pub mod dry_run;
pub mod errors;
pub mod executor;
pub mod http;
pub mod model;
pub mod ports;
pub mod runner;
pub mod shallow;

pub use dry_run::DryRunSessionProvider;
pub use errors::{ExecutorError, SessionError};
pub use executor::{ExecutorOptions, StepExecutor};
pub use http::{HttpSessionConfig, HttpSessionProvider};
pub use model::{
    CaseReport, CompiledStep, ExecutionRecord, RunReport, RunStats, StepOutcome, StepReport,
};
pub use ports::{
    AutomationSession, MockScript, MockSession, MockSessionProvider, SessionCall, SessionProvider,
};
pub use runner::ScenarioRunner;
pub use shallow::{shallow_json, summarize_result, SUMMARY_DEPTH};
