//! Shared primitives for the scenario engine crates.

use std::fmt;
use std::path::Path;

use uuid::Uuid;

pub mod env;

pub use env::{expand_env, EnvProvider, MapEnv, ProcessEnv};

/// How a compiled step reaches the automation session.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ActionType {
    /// Perform an instruction against the page.
    Act,
    /// Pull structured data out of the page.
    Extract,
    /// Free-form intent handed to the session's agent.
    Agent,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Act => "act",
            ActionType::Extract => "extract",
            ActionType::Agent => "agent",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Groups the steps of one scenario onto a single automation session and cache namespace.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(transparent))]
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct WorkflowId(pub String);

impl WorkflowId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// `login.TXT` becomes `login-flow`.
    pub fn from_scenario_path(path: &Path) -> Self {
        let stem = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        let lowered = stem.to_lowercase();
        let base = lowered.strip_suffix(".txt").unwrap_or(&lowered);
        Self(format!("{}-flow", base))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for WorkflowId {
    fn default() -> Self {
        Self("default-flow".to_string())
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(transparent))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct RunId(pub String);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
