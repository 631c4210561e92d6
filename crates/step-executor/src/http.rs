use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use text_tester_core_types::WorkflowId;
use tracing::{debug, warn};

use crate::errors::SessionError;
use crate::ports::{AutomationSession, SessionProvider};

#[derive(Debug, Clone)]
pub struct HttpSessionConfig {
    pub endpoint: String,
    pub request_timeout: Duration,
}

impl HttpSessionConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            request_timeout: Duration::from_secs(120),
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Talks to an automation service over HTTP:
/// `POST <endpoint>/workflows/<workflow>/<act|extract|agent>` with
/// `{"instruction": ...}`.
pub struct HttpSessionProvider {
    client: Client,
    endpoint: String,
    sessions: Mutex<HashMap<WorkflowId, Arc<HttpSession>>>,
}

impl HttpSessionProvider {
    pub fn new(config: HttpSessionConfig) -> Result<Self, SessionError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| {
                SessionError::transport(format!("failed to build HTTP client: {err}"))
            })?;
        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            sessions: Mutex::new(HashMap::new()),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SessionProvider for HttpSessionProvider {
    async fn session(
        &self,
        workflow: &WorkflowId,
    ) -> Result<Arc<dyn AutomationSession>, SessionError> {
        let mut sessions = self.sessions.lock();
        let session: Arc<dyn AutomationSession> = sessions
            .entry(workflow.clone())
            .or_insert_with(|| {
                debug!(workflow = %workflow, endpoint = %self.endpoint, "opening http session");
                Arc::new(HttpSession {
                    client: self.client.clone(),
                    base: format!("{}/workflows/{}", self.endpoint, workflow),
                })
            })
            .clone();
        Ok(session)
    }
}

#[derive(Serialize)]
struct InstructionBody<'a> {
    instruction: &'a str,
}

struct HttpSession {
    client: Client,
    base: String,
}

impl HttpSession {
    async fn call(&self, kind: &str, instruction: &str) -> Result<Value, SessionError> {
        let url = format!("{}/{}", self.base, kind);
        let response = self
            .client
            .post(&url)
            .json(&InstructionBody { instruction })
            .send()
            .await
            .map_err(|err| SessionError::transport(format!("{url}: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<response unavailable>".to_string());
            warn!(url = %url, status = status.as_u16(), "automation request failed");
            return Err(SessionError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let text = response
            .text()
            .await
            .map_err(|err| SessionError::transport(format!("{url}: reading body: {err}")))?;
        Ok(decode_body(&text))
    }
}

/// Empty bodies become `null`; non-JSON bodies are kept as a string.
fn decode_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[async_trait]
impl AutomationSession for HttpSession {
    async fn act(&self, instruction: &str) -> Result<Value, SessionError> {
        self.call("act", instruction).await
    }

    async fn extract(&self, instruction: &str) -> Result<Value, SessionError> {
        self.call("extract", instruction).await
    }

    async fn agent(&self, instruction: &str) -> Result<Value, SessionError> {
        self.call("agent", instruction).await
    }
}
