//! Rule configuration and match data model.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Captured placeholder values. `None` marks a named group that exists in the
/// compiled matcher but did not participate in the match.
pub type Params = BTreeMap<String, Option<String>>;

/// Raw rule entry as written in `translation-rules.yaml`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub validation: ValidationSpec,
}

impl RuleSpec {
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            patterns: Vec::new(),
            template: Some(template.into()),
            validation: ValidationSpec::default(),
        }
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.patterns.push(pattern.into());
        self
    }

    pub fn with_required(mut self, param: impl Into<String>) -> Self {
        self.validation.required.push(param.into());
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSpec {
    #[serde(default)]
    pub required: Vec<String>,
}

/// A pattern string exactly as declared.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternSpec(pub String);

impl PatternSpec {
    pub fn new(source: impl Into<String>) -> Self {
        Self(source.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PatternSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validated rule. Immutable once built; a reload builds new ones.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Rule {
    pub name: String,
    pub patterns: Vec<PatternSpec>,
    pub template: String,
    pub required_params: BTreeSet<String>,
}

/// Which character splits a pattern into whitespace-tolerant segments.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentDelimiter {
    /// `~`: segments joined by optional whitespace.
    #[default]
    Tilde,
    /// `|`: legacy convention, segments joined by any (lazy) run of characters.
    Pipe,
}

impl SegmentDelimiter {
    pub fn as_char(&self) -> char {
        match self {
            SegmentDelimiter::Tilde => '~',
            SegmentDelimiter::Pipe => '|',
        }
    }

    pub fn other(&self) -> SegmentDelimiter {
        match self {
            SegmentDelimiter::Tilde => SegmentDelimiter::Pipe,
            SegmentDelimiter::Pipe => SegmentDelimiter::Tilde,
        }
    }

    /// Expression spliced between compiled segments.
    pub fn joiner(&self) -> &'static str {
        match self {
            SegmentDelimiter::Tilde => r"\s*",
            SegmentDelimiter::Pipe => ".*?",
        }
    }
}

/// Placeholder name to constraining expression fragment, anchors stripped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParamPatternLibrary {
    fragments: BTreeMap<String, String>,
}

impl ParamPatternLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut library = Self::new();
        for (name, fragment) in entries {
            library.insert(name, fragment.as_ref());
        }
        library
    }

    /// Stores `fragment` with a leading `^` and an unescaped trailing `$` removed.
    pub fn insert(&mut self, name: impl Into<String>, fragment: &str) {
        let stripped = strip_anchors(fragment);
        if stripped.is_empty() {
            return;
        }
        self.fragments.insert(name.into(), stripped.to_string());
    }

    pub fn fragment(&self, name: &str) -> Option<&str> {
        self.fragments.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fragments
            .iter()
            .map(|(name, fragment)| (name.as_str(), fragment.as_str()))
    }
}

fn strip_anchors(fragment: &str) -> &str {
    let start = fragment.strip_prefix('^').unwrap_or(fragment);
    match start.strip_suffix('$') {
        Some(rest) if !ends_with_escape(rest) => rest,
        _ => start,
    }
}

fn ends_with_escape(text: &str) -> bool {
    text.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

/// First rule/pattern pair that accepted an input line.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchResult {
    pub rule: Arc<Rule>,
    pub pattern: PatternSpec,
    pub params: Params,
}
