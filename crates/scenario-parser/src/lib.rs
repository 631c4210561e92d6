//! Scenario documents.
//!
//! A scenario is UTF-8 text: `## title` opens a test case, `# text` is a
//! comment annotating the next step, a line holding only `"+"` opens a
//! verbatim multiline block closed by a line holding only `"-"`, and every
//! other non-blank line inside a case is a step (optionally followed by an
//! inline `# comment`).

pub mod errors;
pub mod model;
pub mod parser;
pub mod workflow;

pub use errors::ParseError;
pub use model::{ScenarioDocument, ScenarioStats, Step, TestCase};
pub use parser::ScenarioParser;
pub use workflow::determine_workflow;
