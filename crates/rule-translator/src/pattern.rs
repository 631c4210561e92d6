//! Pattern compilation.
//!
//! A pattern mixes literal text, `{name}` placeholders and (optionally) the
//! configured segment delimiter. Compilation produces a matcher that must
//! accept the whole trimmed input line. The matcher engine sits behind
//! [`PatternCompiler`] so the rule set never depends on a concrete regex
//! implementation.

use std::collections::HashSet;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::PatternError;
use crate::model::{ParamPatternLibrary, Params, SegmentDelimiter};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder regex"));

/// Capture used for placeholders without a library entry.
pub const DEFAULT_FRAGMENT: &str = ".+?";

pub trait PatternMatcher: Send + Sync + fmt::Debug {
    /// Engine-specific text of the compiled matcher, for diagnostics.
    fn expression(&self) -> &str;

    /// Captures when `input` matches in full, `None` otherwise.
    fn captures(&self, input: &str) -> Option<Params>;

    fn is_match(&self, input: &str) -> bool {
        self.captures(input).is_some()
    }
}

pub trait PatternCompiler: Send + Sync {
    fn compile(
        &self,
        pattern: &str,
        delimiter: SegmentDelimiter,
        library: &ParamPatternLibrary,
    ) -> Result<Box<dyn PatternMatcher>, PatternError>;
}

/// Placeholder names in declaration order.
pub fn placeholders(pattern: &str) -> Vec<String> {
    PLACEHOLDER
        .captures_iter(pattern)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Structural checks shared by every compiler: non-empty, unique placeholder
/// names, no foreign delimiter.
pub fn check_pattern(pattern: &str, delimiter: SegmentDelimiter) -> Result<(), PatternError> {
    if pattern.trim().is_empty() {
        return Err(PatternError::Empty);
    }
    let foreign = delimiter.other().as_char();
    if pattern.contains(foreign) {
        return Err(PatternError::DelimiterMismatch {
            expected: delimiter.as_char(),
            found: foreign,
        });
    }
    let mut seen = HashSet::new();
    for name in placeholders(pattern) {
        if !seen.insert(name.clone()) {
            return Err(PatternError::DuplicatePlaceholder(name));
        }
    }
    Ok(())
}

/// Splits on the delimiter, trimming each segment and dropping empty ones.
/// A pattern without the delimiter is a single, untrimmed segment.
pub fn segments(pattern: &str, delimiter: SegmentDelimiter) -> Vec<&str> {
    let sep = delimiter.as_char();
    if !pattern.contains(sep) {
        return vec![pattern];
    }
    pattern
        .split(sep)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Compiles patterns to `regex::Regex`.
#[derive(Clone, Copy, Debug, Default)]
pub struct RegexPatternCompiler;

impl RegexPatternCompiler {
    pub fn new() -> Self {
        Self
    }

    /// Anchored expression source for `pattern`.
    pub fn expression(
        &self,
        pattern: &str,
        delimiter: SegmentDelimiter,
        library: &ParamPatternLibrary,
    ) -> String {
        let body = segments(pattern, delimiter)
            .into_iter()
            .map(|segment| compile_segment(segment, library))
            .collect::<Vec<_>>()
            .join(delimiter.joiner());
        format!("^(?:{})$", body)
    }
}

impl PatternCompiler for RegexPatternCompiler {
    fn compile(
        &self,
        pattern: &str,
        delimiter: SegmentDelimiter,
        library: &ParamPatternLibrary,
    ) -> Result<Box<dyn PatternMatcher>, PatternError> {
        check_pattern(pattern, delimiter)?;
        let source = self.expression(pattern, delimiter, library);
        let regex = Regex::new(&source)
            .map_err(|err| PatternError::InvalidExpression(err.to_string()))?;
        Ok(Box::new(RegexMatcher { source, regex }))
    }
}

fn compile_segment(segment: &str, library: &ParamPatternLibrary) -> String {
    let mut out = String::new();
    let mut last = 0;
    for caps in PLACEHOLDER.captures_iter(segment) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        out.push_str(&regex::escape(&segment[last..whole.start()]));
        let name = &caps[1];
        let fragment = library.fragment(name).unwrap_or(DEFAULT_FRAGMENT);
        out.push_str(&format!("(?P<{}>{})", name, fragment));
        last = whole.end();
    }
    out.push_str(&regex::escape(&segment[last..]));
    out
}

#[derive(Debug)]
struct RegexMatcher {
    source: String,
    regex: Regex,
}

impl PatternMatcher for RegexMatcher {
    fn expression(&self) -> &str {
        &self.source
    }

    fn captures(&self, input: &str) -> Option<Params> {
        let caps = self.regex.captures(input)?;
        let params = self
            .regex
            .capture_names()
            .flatten()
            .map(|name| {
                let value = caps.name(name).map(|m| m.as_str().trim().to_string());
                (name.to_string(), value)
            })
            .collect();
        Some(params)
    }

    fn is_match(&self, input: &str) -> bool {
        self.regex.is_match(input)
    }
}
