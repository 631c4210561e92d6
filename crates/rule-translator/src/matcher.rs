//! First-match rule resolution.

use std::sync::Arc;

use serde::Serialize;

use crate::model::{MatchResult, PatternSpec, Rule};
use crate::pattern::PatternMatcher;

#[derive(Debug)]
pub struct CompiledRule {
    rule: Arc<Rule>,
    matchers: Vec<(PatternSpec, Box<dyn PatternMatcher>)>,
}

impl CompiledRule {
    /// `matchers` must be in the rule's pattern declaration order.
    pub fn new(rule: Rule, matchers: Vec<(PatternSpec, Box<dyn PatternMatcher>)>) -> Self {
        Self {
            rule: Arc::new(rule),
            matchers,
        }
    }

    pub fn rule(&self) -> &Arc<Rule> {
        &self.rule
    }

    pub fn matchers(&self) -> impl Iterator<Item = (&PatternSpec, &dyn PatternMatcher)> {
        self.matchers
            .iter()
            .map(|(pattern, matcher)| (pattern, matcher.as_ref()))
    }

    fn first_match(&self, line: &str) -> Option<MatchResult> {
        self.matchers.iter().find_map(|(pattern, matcher)| {
            matcher.captures(line).map(|params| MatchResult {
                rule: Arc::clone(&self.rule),
                pattern: pattern.clone(),
                params,
            })
        })
    }
}

/// A rule/pattern pair that accepts some input, reported for diagnostics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub rule: String,
    pub pattern: PatternSpec,
    pub expression: String,
}

/// Compiled rules in declaration order.
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<CompiledRule>) -> Self {
        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> impl Iterator<Item = &Arc<Rule>> {
        self.rules.iter().map(CompiledRule::rule)
    }

    /// Rules in declaration order, then patterns in declaration order; first hit wins.
    pub fn find(&self, text: &str) -> Option<MatchResult> {
        let line = text.trim();
        self.rules.iter().find_map(|rule| rule.first_match(line))
    }

    /// Every pair that accepts `text`, in precedence order.
    pub fn candidates(&self, text: &str) -> Vec<Candidate> {
        let line = text.trim();
        self.rules
            .iter()
            .flat_map(|compiled| {
                compiled
                    .matchers()
                    .filter(|(_, matcher)| matcher.is_match(line))
                    .map(|(pattern, matcher)| Candidate {
                        rule: compiled.rule().name.clone(),
                        pattern: pattern.clone(),
                        expression: matcher.expression().to_string(),
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}
