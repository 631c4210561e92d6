use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use text_tester_core_types::{ActionType, WorkflowId};

use crate::errors::SessionError;

/// A live browser-automation session bound to one workflow.
#[async_trait]
pub trait AutomationSession: Send + Sync {
    /// Performs an interaction rendered by a rule template.
    async fn act(&self, instruction: &str) -> Result<Value, SessionError>;

    /// Reads data from the page.
    async fn extract(&self, instruction: &str) -> Result<Value, SessionError>;

    /// Free-form natural-language step that no rule matched.
    async fn agent(&self, instruction: &str) -> Result<Value, SessionError> {
        self.act(instruction).await
    }
}

/// Hands out sessions keyed by workflow. Implementations reuse one session
/// per workflow for the lifetime of the provider.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn session(
        &self,
        workflow: &WorkflowId,
    ) -> Result<Arc<dyn AutomationSession>, SessionError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionCall {
    pub kind: ActionType,
    pub instruction: String,
}

/// Scripted behaviour shared by every [`MockSession`] a provider creates.
#[derive(Clone, Debug, Default)]
pub struct MockScript {
    failures: Vec<(String, String)>,
    responses: Vec<(String, Value)>,
    delay: Option<Duration>,
}

impl MockScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Any instruction containing `needle` fails with `message`.
    pub fn fail_on(mut self, needle: impl Into<String>, message: impl Into<String>) -> Self {
        self.failures.push((needle.into(), message.into()));
        self
    }

    /// Any instruction containing `needle` returns `value`.
    pub fn respond(mut self, needle: impl Into<String>, value: Value) -> Self {
        self.responses.push((needle.into(), value));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// In-memory session that records every call.
#[derive(Debug, Default)]
pub struct MockSession {
    script: MockScript,
    calls: Mutex<Vec<SessionCall>>,
}

impl MockSession {
    pub fn new(script: MockScript) -> Self {
        Self {
            script,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<SessionCall> {
        self.calls.lock().clone()
    }

    async fn handle(&self, kind: ActionType, instruction: &str) -> Result<Value, SessionError> {
        self.calls.lock().push(SessionCall {
            kind,
            instruction: instruction.to_string(),
        });
        if let Some(delay) = self.script.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some((_, message)) = self
            .script
            .failures
            .iter()
            .find(|(needle, _)| instruction.contains(needle.as_str()))
        {
            return Err(SessionError::rejected(message.clone()));
        }
        if let Some((_, value)) = self
            .script
            .responses
            .iter()
            .find(|(needle, _)| instruction.contains(needle.as_str()))
        {
            return Ok(value.clone());
        }
        Ok(match kind {
            ActionType::Extract => json!({ "extracted": instruction }),
            _ => json!({ "status": "done" }),
        })
    }
}

#[async_trait]
impl AutomationSession for MockSession {
    async fn act(&self, instruction: &str) -> Result<Value, SessionError> {
        self.handle(ActionType::Act, instruction).await
    }

    async fn extract(&self, instruction: &str) -> Result<Value, SessionError> {
        self.handle(ActionType::Extract, instruction).await
    }

    async fn agent(&self, instruction: &str) -> Result<Value, SessionError> {
        self.handle(ActionType::Agent, instruction).await
    }
}

/// Deterministic provider for tests and offline runs.
#[derive(Debug, Default)]
pub struct MockSessionProvider {
    script: MockScript,
    sessions: Mutex<HashMap<WorkflowId, Arc<MockSession>>>,
    opened: Mutex<Vec<WorkflowId>>,
}

impl MockSessionProvider {
    pub fn new(script: MockScript) -> Self {
        Self {
            script,
            ..Self::default()
        }
    }

    pub fn session_for(&self, workflow: &WorkflowId) -> Option<Arc<MockSession>> {
        self.sessions.lock().get(workflow).cloned()
    }

    /// Workflows in the order their session was first opened.
    pub fn opened(&self) -> Vec<WorkflowId> {
        self.opened.lock().clone()
    }
}

#[async_trait]
impl SessionProvider for MockSessionProvider {
    async fn session(
        &self,
        workflow: &WorkflowId,
    ) -> Result<Arc<dyn AutomationSession>, SessionError> {
        let mut sessions = self.sessions.lock();
        let session: Arc<dyn AutomationSession> = sessions
            .entry(workflow.clone())
            .or_insert_with(|| {
                self.opened.lock().push(workflow.clone());
                Arc::new(MockSession::new(self.script.clone()))
            })
            .clone();
        Ok(session)
    }
}
