use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use text_tester_core_types::WorkflowId;
use tracing::info;

use crate::errors::SessionError;
use crate::ports::{AutomationSession, SessionProvider};

/// Logs every instruction and reports success without touching a browser.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunSessionProvider;

#[derive(Debug)]
struct DryRunSession {
    workflow: WorkflowId,
}

impl DryRunSession {
    fn log(&self, kind: &str, instruction: &str) -> Result<Value, SessionError> {
        info!(
            target: "dry_run",
            workflow = %self.workflow,
            kind,
            instruction,
            "skipping automation"
        );
        Ok(Value::Null)
    }
}

#[async_trait]
impl AutomationSession for DryRunSession {
    async fn act(&self, instruction: &str) -> Result<Value, SessionError> {
        self.log("act", instruction)
    }

    async fn extract(&self, instruction: &str) -> Result<Value, SessionError> {
        self.log("extract", instruction)
    }

    async fn agent(&self, instruction: &str) -> Result<Value, SessionError> {
        self.log("agent", instruction)
    }
}

#[async_trait]
impl SessionProvider for DryRunSessionProvider {
    async fn session(
        &self,
        workflow: &WorkflowId,
    ) -> Result<Arc<dyn AutomationSession>, SessionError> {
        Ok(Arc::new(DryRunSession {
            workflow: workflow.clone(),
        }))
    }
}
