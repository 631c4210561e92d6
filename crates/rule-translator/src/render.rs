//! Template rendering and action-type inference.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::model::Params;
use text_tester_core_types::ActionType;

static TEMPLATE_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(\w+)\}").expect("template placeholder regex"));

static EXTRACT_CONSTRUCT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bextract\s*[(:]").expect("extract construct regex"));

/// Substitutes `{name}` with its captured value. Unknown or non-participating
/// names stay as literal `{name}` so a bad rule is visible in the output.
pub fn render_template(template: &str, params: &Params) -> String {
    TEMPLATE_PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            match params.get(&caps[1]).and_then(|value| value.as_deref()) {
                Some(value) => value.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Placeholder names referenced by a template, in order of first use.
pub fn template_placeholders(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in TEMPLATE_PLACEHOLDER.captures_iter(template) {
        let name = caps[1].to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// `extract(...)`/`extract: ...` style templates extract, everything else acts.
pub fn infer_action_type(template: &str) -> ActionType {
    if EXTRACT_CONSTRUCT.is_match(template) {
        ActionType::Extract
    } else {
        ActionType::Act
    }
}
