//! Rule-based translation of natural-language scenario steps.
//!
//! Rules pair one or more text patterns with an action template. Patterns are
//! compiled to anchored matchers with one named capture per `{placeholder}`;
//! the first rule (in declaration order) whose pattern accepts a step wins and
//! its captures are rendered into the template. Steps no rule accepts fall
//! back to agent mode.

pub mod config;
pub mod errors;
pub mod matcher;
pub mod model;
pub mod pattern;
pub mod render;
pub mod translator;

pub use config::{validate_config_dir, CoreTranslationConfig, RuleSource, CORE_FILE, RULES_FILE};
pub use errors::{ConfigError, ConfigIssue, PatternError, TranslateError};
pub use matcher::{Candidate, CompiledRule, RuleSet};
pub use model::{
    MatchResult, ParamPatternLibrary, Params, PatternSpec, Rule, RuleSpec, SegmentDelimiter,
    ValidationSpec,
};
pub use pattern::{PatternCompiler, PatternMatcher, RegexPatternCompiler};
pub use render::{infer_action_type, render_template, template_placeholders};
pub use translator::{
    AgentTranslation, ParamCheck, ReloadSummary, RuleBook, RuleTranslation, Translation,
    Translator, TranslatorOptions,
};
pub use text_tester_core_types::ActionType;
