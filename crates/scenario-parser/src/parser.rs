use std::path::Path;
use std::sync::Arc;

use text_tester_core_types::{expand_env, EnvProvider, ProcessEnv, WorkflowId};
use tracing::{debug, warn};

use crate::errors::ParseError;
use crate::model::{ScenarioDocument, Step, TestCase};

const CASE_MARKER: &str = "##";
const COMMENT_MARKER: char = '#';
const CASE_SEPARATOR: &str = "---";
const MULTILINE_OPEN: &str = "\"+\"";
const MULTILINE_CLOSE: &str = "\"-\"";
const UNTITLED_PREFIX: &str = "Untitled case";

/// Line-oriented scenario parser.
///
/// Parsing never fails on content; malformed input degrades to warnings.
#[derive(Clone)]
pub struct ScenarioParser {
    env: Arc<dyn EnvProvider>,
}

impl Default for ScenarioParser {
    fn default() -> Self {
        Self::new(Arc::new(ProcessEnv))
    }
}

impl std::fmt::Debug for ScenarioParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioParser").finish_non_exhaustive()
    }
}

impl ScenarioParser {
    pub fn new(env: Arc<dyn EnvProvider>) -> Self {
        Self { env }
    }

    pub fn parse_str(&self, content: &str) -> Vec<TestCase> {
        let mut machine = LineMachine::new(self.env.as_ref());
        for (index, line) in content.lines().enumerate() {
            machine.feed(index + 1, line);
        }
        machine.finish()
    }

    pub fn parse_file(
        &self,
        path: &Path,
        workflow: WorkflowId,
    ) -> Result<ScenarioDocument, ParseError> {
        let content = std::fs::read_to_string(path).map_err(|source| ParseError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let cases = self.parse_str(&content);
        let document = ScenarioDocument {
            path: Some(path.to_path_buf()),
            workflow,
            cases,
        };
        let stats = document.stats();
        debug!(
            path = %path.display(),
            cases = stats.cases,
            steps = stats.steps,
            multiline = stats.multiline_steps,
            "parsed scenario"
        );
        Ok(document)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    OutsideCase,
    InsideCase,
    InsideMultiline,
}

struct LineMachine<'a> {
    env: &'a dyn EnvProvider,
    state: State,
    cases: Vec<TestCase>,
    current: Option<TestCase>,
    pending_comment: Option<String>,
    block: Vec<String>,
    block_opened_at: usize,
}

impl<'a> LineMachine<'a> {
    fn new(env: &'a dyn EnvProvider) -> Self {
        Self {
            env,
            state: State::OutsideCase,
            cases: Vec::new(),
            current: None,
            pending_comment: None,
            block: Vec::new(),
            block_opened_at: 0,
        }
    }

    fn feed(&mut self, line_no: usize, raw: &str) {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        let trimmed = raw.trim();

        if self.state == State::InsideMultiline {
            if trimmed == MULTILINE_CLOSE {
                self.close_block();
            } else {
                self.block.push(raw.to_string());
            }
            return;
        }

        if trimmed == MULTILINE_OPEN {
            self.block.clear();
            self.block_opened_at = line_no;
            self.state = State::InsideMultiline;
            return;
        }

        if trimmed.is_empty() {
            return;
        }

        if let Some(title) = case_title(trimmed) {
            let name = if title.is_empty() {
                self.untitled_name()
            } else {
                title.to_string()
            };
            self.open_case(name);
            return;
        }

        if trimmed.starts_with(COMMENT_MARKER) {
            self.comment(line_no, trimmed);
            return;
        }

        if self.state == State::OutsideCase {
            debug!(line = line_no, "ignoring line outside any test case");
            return;
        }

        if trimmed.starts_with(CASE_SEPARATOR) {
            let name = self.untitled_name();
            self.open_case(name);
            return;
        }

        let (action, inline_comment) = split_inline_comment(trimmed);
        let action = expand_env(&action, self.env);
        if action.is_empty() {
            self.pending_comment = None;
            return;
        }
        let comment = inline_comment
            .map(|text| expand_env(&text, self.env))
            .or_else(|| self.pending_comment.take());
        self.pending_comment = None;
        if let Some(case) = self.current.as_mut() {
            case.steps.push(Step {
                action,
                comment,
                is_multiline: false,
            });
        }
    }

    fn finish(mut self) -> Vec<TestCase> {
        if self.state == State::InsideMultiline {
            warn!(
                line = self.block_opened_at,
                "multiline block was never closed; keeping collected lines"
            );
            self.close_block();
        }
        self.flush_case();
        self.cases
    }

    fn comment(&mut self, line_no: usize, trimmed: &str) {
        let text = trimmed
            .strip_prefix(COMMENT_MARKER)
            .unwrap_or(trimmed)
            .trim();
        match self.current.as_mut() {
            Some(case) if !text.is_empty() => {
                case.comments.push(text.to_string());
                self.pending_comment = Some(text.to_string());
            }
            Some(_) => {}
            None => debug!(line = line_no, "ignoring comment outside any test case"),
        }
    }

    fn close_block(&mut self) {
        let lines = std::mem::take(&mut self.block);
        self.state = if self.current.is_some() {
            State::InsideCase
        } else {
            State::OutsideCase
        };
        if lines.is_empty() {
            return;
        }
        let Some(case) = self.current.as_mut() else {
            warn!(
                line = self.block_opened_at,
                "multiline block outside any test case dropped"
            );
            return;
        };
        case.steps.push(Step {
            action: lines.join("\n"),
            comment: self.pending_comment.take(),
            is_multiline: true,
        });
    }

    fn open_case(&mut self, name: String) {
        self.flush_case();
        self.current = Some(TestCase::new(name));
        self.state = State::InsideCase;
    }

    fn flush_case(&mut self) {
        self.pending_comment = None;
        if let Some(case) = self.current.take() {
            self.cases.push(case);
        }
    }

    fn untitled_name(&self) -> String {
        let emitted = self.cases.len() + usize::from(self.current.is_some());
        format!("{UNTITLED_PREFIX} {}", emitted + 1)
    }
}

fn case_title(trimmed: &str) -> Option<&str> {
    let rest = trimmed.strip_prefix(CASE_MARKER)?;
    if rest.is_empty() {
        return Some("");
    }
    if rest.starts_with(char::is_whitespace) {
        return Some(rest.trim());
    }
    None
}

/// Splits `action # comment` on the first unescaped `#`. `\#` yields a
/// literal `#` in the action. A trailing `#` with no text is kept as-is.
fn split_inline_comment(line: &str) -> (String, Option<String>) {
    let mut action = String::with_capacity(line.len());
    let mut chars = line.char_indices().peekable();
    while let Some((index, ch)) = chars.next() {
        match ch {
            '\\' if matches!(chars.peek(), Some((_, COMMENT_MARKER))) => {
                action.push(COMMENT_MARKER);
                chars.next();
            }
            COMMENT_MARKER => {
                let comment = line[index + 1..].trim();
                if comment.is_empty() {
                    action.push_str(&line[index..]);
                    return (action.trim().to_string(), None);
                }
                return (action.trim().to_string(), Some(comment.to_string()));
            }
            other => action.push(other),
        }
    }
    (action.trim().to_string(), None)
}
