use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use text_tester_core_types::WorkflowId;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub action: String,
    pub comment: Option<String>,
    #[serde(default)]
    pub is_multiline: bool,
}

impl Step {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            comment: None,
            is_multiline: false,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,
    #[serde(default)]
    pub comments: Vec<String>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl TestCase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            comments: Vec::new(),
            steps: Vec::new(),
        }
    }

    pub fn multiline_steps(&self) -> usize {
        self.steps.iter().filter(|step| step.is_multiline).count()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioDocument {
    pub path: Option<PathBuf>,
    pub workflow: WorkflowId,
    pub cases: Vec<TestCase>,
}

impl ScenarioDocument {
    pub fn stats(&self) -> ScenarioStats {
        ScenarioStats {
            cases: self.cases.len(),
            steps: self.cases.iter().map(|case| case.steps.len()).sum(),
            multiline_steps: self.cases.iter().map(TestCase::multiline_steps).sum(),
        }
    }

    pub fn case(&self, name: &str) -> Option<&TestCase> {
        self.cases.iter().find(|case| case.name == name)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioStats {
    pub cases: usize,
    pub steps: usize,
    pub multiline_steps: usize,
}
