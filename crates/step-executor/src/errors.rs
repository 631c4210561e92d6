use rule_translator::TranslateError;
use thiserror::Error;

/// Failures reported by an automation session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The session understood the instruction but refused or failed it.
    #[error("automation rejected the step: {0}")]
    Rejected(String),

    #[error("automation endpoint unreachable: {0}")]
    Transport(String),

    #[error("automation endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not open a session for workflow {workflow}: {message}")]
    Unavailable { workflow: String, message: String },
}

impl SessionError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }
}

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error(transparent)]
    Translate(#[from] TranslateError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("step timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}
