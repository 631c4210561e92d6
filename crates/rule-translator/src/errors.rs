use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// One problem found while loading or validating rule configuration.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct ConfigIssue {
    /// File (or inline source label) the problem was found in.
    pub source: String,
    /// Zero-based index of the offending rule, if the issue is rule-scoped.
    pub rule_index: Option<usize>,
    pub rule_name: Option<String>,
    pub message: String,
}

impl ConfigIssue {
    pub fn file(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            rule_index: None,
            rule_name: None,
            message: message.into(),
        }
    }

    pub fn rule(
        source: impl Into<String>,
        index: usize,
        name: Option<&str>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            rule_index: Some(index),
            rule_name: name.map(str::to_string),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.rule_index, self.rule_name.as_deref()) {
            (Some(index), Some(name)) => {
                write!(f, "{}: rule {} ({}): {}", self.source, index, name, self.message)
            }
            (Some(index), None) => write!(f, "{}: rule {}: {}", self.source, index, self.message),
            _ => write!(f, "{}: {}", self.source, self.message),
        }
    }
}

/// Problems with a single pattern string, raised at compile time.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("pattern is empty")]
    Empty,

    #[error("placeholder {{{0}}} appears more than once")]
    DuplicatePlaceholder(String),

    #[error("pattern uses '{found}' but the configured segment delimiter is '{expected}'")]
    DelimiterMismatch { expected: char, found: char },

    #[error("pattern does not compile: {0}")]
    InvalidExpression(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid yaml in {path}: {message}")]
    Yaml { path: PathBuf, message: String },

    #[error("configuration has {} problem(s):\n - {}", .0.len(), join_issues(.0))]
    Invalid(Vec<ConfigIssue>),
}

impl ConfigError {
    pub fn yaml(path: impl Into<PathBuf>, err: impl fmt::Display) -> Self {
        Self::Yaml {
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub fn issues(&self) -> Vec<ConfigIssue> {
        match self {
            ConfigError::Invalid(issues) => issues.clone(),
            ConfigError::Io { path, source } => {
                vec![ConfigIssue::file(path.display().to_string(), source.to_string())]
            }
            ConfigError::Yaml { path, message } => {
                vec![ConfigIssue::file(path.display().to_string(), message.clone())]
            }
        }
    }
}

fn join_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(|issue| issue.to_string())
        .collect::<Vec<_>>()
        .join("\n - ")
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TranslateError {
    /// Strict mode only; otherwise missing parameters are a warning.
    #[error("rule {rule} is missing required parameter(s): {}", .missing.join(", "))]
    MissingParams { rule: String, missing: Vec<String> },
}
