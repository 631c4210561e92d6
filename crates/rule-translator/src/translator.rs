//! The translator owns the active rule book and turns step text into a
//! [`Translation`].

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::config::{compile_rule_spec, RuleSource};
use crate::errors::{ConfigIssue, TranslateError};
use crate::matcher::{Candidate, RuleSet};
use crate::model::{ParamPatternLibrary, Params, PatternSpec, SegmentDelimiter};
use crate::pattern::{PatternCompiler, RegexPatternCompiler};
use crate::render::{infer_action_type, render_template};
use text_tester_core_types::{expand_env, ActionType, EnvProvider, ProcessEnv};

/// Immutable snapshot of everything loaded from the rule source.
#[derive(Debug, Default)]
pub struct RuleBook {
    pub rules: RuleSet,
    pub library: ParamPatternLibrary,
    pub delimiter: SegmentDelimiter,
    pub strict: bool,
    pub issues: Vec<ConfigIssue>,
}

impl RuleBook {
    /// Builds a complete book; invalid rules are left out and reported.
    pub fn build(
        source: &RuleSource,
        strict_override: Option<bool>,
        compiler: &dyn PatternCompiler,
    ) -> Self {
        let contents = source.read();
        let label = source.label();
        let library = contents.translation.library();
        let delimiter = contents.translation.delimiter;
        let mut issues = contents.issues;

        let mut compiled = Vec::with_capacity(contents.entries.len());
        for (index, spec) in &contents.entries {
            match compile_rule_spec(&label, *index, spec, delimiter, &library, compiler) {
                Ok(rule) => compiled.push(rule),
                Err(rule_issues) => issues.extend(rule_issues),
            }
        }

        Self {
            rules: RuleSet::new(compiled),
            library,
            delimiter,
            strict: strict_override.unwrap_or(contents.translation.strict),
            issues,
        }
    }
}

pub struct TranslatorOptions {
    pub source: RuleSource,
    /// Overrides `translation.strict` from the configuration when set.
    pub strict_mode: Option<bool>,
    pub env: Arc<dyn EnvProvider>,
    pub compiler: Arc<dyn PatternCompiler>,
}

impl TranslatorOptions {
    pub fn new(source: RuleSource) -> Self {
        Self {
            source,
            strict_mode: None,
            env: Arc::new(ProcessEnv),
            compiler: Arc::new(RegexPatternCompiler),
        }
    }

    pub fn from_config_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(RuleSource::config_dir(dir))
    }

    pub fn with_strict_mode(mut self, strict: bool) -> Self {
        self.strict_mode = Some(strict);
        self
    }

    pub fn with_env(mut self, env: Arc<dyn EnvProvider>) -> Self {
        self.env = env;
        self
    }

    pub fn with_compiler(mut self, compiler: Arc<dyn PatternCompiler>) -> Self {
        self.compiler = compiler;
        self
    }
}

/// Outcome of required-parameter validation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ParamCheck {
    pub missing: Vec<String>,
}

impl ParamCheck {
    /// A required parameter must be present and non-blank.
    pub fn evaluate(required: &BTreeSet<String>, params: &Params) -> Self {
        let missing = required
            .iter()
            .filter(|name| {
                params
                    .get(name.as_str())
                    .and_then(|value| value.as_deref())
                    .map_or(true, |value| value.trim().is_empty())
            })
            .cloned()
            .collect();
        Self { missing }
    }

    pub fn is_ok(&self) -> bool {
        self.missing.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RuleTranslation {
    /// Step text after `%NAME%` expansion.
    pub action: String,
    pub action_raw: String,
    pub rule: String,
    pub pattern: PatternSpec,
    pub params: Params,
    pub template: String,
    pub code: String,
    pub action_type: ActionType,
    pub validation: ParamCheck,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AgentTranslation {
    /// Step text after `%NAME%` expansion, handed to the agent verbatim.
    pub action: String,
    pub action_raw: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "engine", rename_all = "snake_case")]
pub enum Translation {
    Rules(RuleTranslation),
    Agent(AgentTranslation),
}

impl Translation {
    pub fn engine(&self) -> &'static str {
        match self {
            Translation::Rules(_) => "rules",
            Translation::Agent(_) => "agent",
        }
    }

    pub fn action(&self) -> &str {
        match self {
            Translation::Rules(rules) => &rules.action,
            Translation::Agent(agent) => &agent.action,
        }
    }

    pub fn action_type(&self) -> ActionType {
        match self {
            Translation::Rules(rules) => rules.action_type,
            Translation::Agent(_) => ActionType::Agent,
        }
    }

    /// What gets sent to the automation session.
    pub fn code(&self) -> &str {
        match self {
            Translation::Rules(rules) => &rules.code,
            Translation::Agent(agent) => &agent.action,
        }
    }

    pub fn as_rules(&self) -> Option<&RuleTranslation> {
        match self {
            Translation::Rules(rules) => Some(rules),
            Translation::Agent(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReloadSummary {
    pub rules: usize,
    pub issues: Vec<ConfigIssue>,
}

pub struct Translator {
    options: TranslatorOptions,
    book: ArcSwap<RuleBook>,
}

impl Translator {
    /// Never fails: configuration problems are logged and kept in
    /// [`Translator::issues`], and translation degrades to agent-only.
    pub fn load(options: TranslatorOptions) -> Self {
        let book = RuleBook::build(&options.source, options.strict_mode, options.compiler.as_ref());
        log_book(&options.source, &book);
        Self {
            options,
            book: ArcSwap::from_pointee(book),
        }
    }

    pub fn from_config_dir(dir: impl AsRef<Path>) -> Self {
        Self::load(TranslatorOptions::from_config_dir(dir))
    }

    /// Current rule book. Holding the returned `Arc` pins one consistent view.
    pub fn snapshot(&self) -> Arc<RuleBook> {
        self.book.load_full()
    }

    pub fn rule_count(&self) -> usize {
        self.book.load().rules.len()
    }

    pub fn issues(&self) -> Vec<ConfigIssue> {
        self.book.load().issues.clone()
    }

    pub fn is_strict(&self) -> bool {
        self.book.load().strict
    }

    pub fn env(&self) -> &Arc<dyn EnvProvider> {
        &self.options.env
    }

    /// Expands `%NAME%` placeholders in `text`, then resolves it.
    pub fn translate(&self, text: &str) -> Result<Translation, TranslateError> {
        let action = expand_env(text, self.options.env.as_ref());
        self.resolve(text, action)
    }

    /// Resolves text whose placeholders were already expanded (parsed
    /// scenario steps). No second expansion pass runs.
    pub fn translate_expanded(&self, action: &str) -> Result<Translation, TranslateError> {
        self.resolve(action, action.to_string())
    }

    #[instrument(skip(self, text), fields(engine = tracing::field::Empty))]
    fn resolve(&self, text: &str, action: String) -> Result<Translation, TranslateError> {
        let book = self.book.load_full();

        let Some(hit) = book.rules.find(&action) else {
            tracing::Span::current().record("engine", "agent");
            debug!("no rule matched; falling back to agent mode");
            return Ok(Translation::Agent(AgentTranslation {
                action,
                action_raw: text.to_string(),
            }));
        };
        tracing::Span::current().record("engine", "rules");

        let validation = ParamCheck::evaluate(&hit.rule.required_params, &hit.params);
        if !validation.is_ok() {
            if book.strict {
                return Err(TranslateError::MissingParams {
                    rule: hit.rule.name.clone(),
                    missing: validation.missing,
                });
            }
            warn!(
                rule = %hit.rule.name,
                missing = ?validation.missing,
                "required parameters missing"
            );
        }

        let code = render_template(&hit.rule.template, &hit.params);
        debug!(rule = %hit.rule.name, pattern = %hit.pattern, "rule matched");
        Ok(Translation::Rules(RuleTranslation {
            action,
            action_raw: text.to_string(),
            rule: hit.rule.name.clone(),
            pattern: hit.pattern,
            action_type: infer_action_type(&hit.rule.template),
            template: hit.rule.template.clone(),
            params: hit.params,
            code,
            validation,
        }))
    }

    /// Rule/pattern pairs that accept `text` after expansion, in precedence order.
    pub fn candidates(&self, text: &str) -> Vec<Candidate> {
        let action = expand_env(text, self.options.env.as_ref());
        self.book.load().rules.candidates(&action)
    }

    /// Rebuilds the rule book from the source and swaps it in whole.
    pub fn reload(&self) -> ReloadSummary {
        let book = RuleBook::build(
            &self.options.source,
            self.options.strict_mode,
            self.options.compiler.as_ref(),
        );
        log_book(&self.options.source, &book);
        let summary = ReloadSummary {
            rules: book.rules.len(),
            issues: book.issues.clone(),
        };
        self.book.store(Arc::new(book));
        summary
    }
}

fn log_book(source: &RuleSource, book: &RuleBook) {
    for issue in &book.issues {
        warn!(%issue, "rule configuration problem");
    }
    info!(
        source = %source.label(),
        rules = book.rules.len(),
        params = book.library.len(),
        strict = book.strict,
        "translation rules loaded"
    );
}
