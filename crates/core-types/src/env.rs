//! `%NAME%` placeholder expansion against an injected variable source.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static ENV_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%(\w+)%").expect("env placeholder regex"));

/// Read-only key/value capability used for placeholder expansion.
pub trait EnvProvider: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
}

/// Looks variables up in the process environment.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessEnv;

impl EnvProvider for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Fixed variable set, mostly for tests and previews.
#[derive(Clone, Debug, Default)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl EnvProvider for MapEnv {
    fn get(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

impl<T: EnvProvider + ?Sized> EnvProvider for std::sync::Arc<T> {
    fn get(&self, name: &str) -> Option<String> {
        (**self).get(name)
    }
}

/// Replace every `%NAME%` whose variable is set and non-empty; leave the rest verbatim.
pub fn expand_env(text: &str, env: &dyn EnvProvider) -> String {
    if !text.contains('%') {
        return text.to_string();
    }
    ENV_PLACEHOLDER
        .replace_all(text, |caps: &Captures<'_>| match env.get(&caps[1]) {
            Some(value) if !value.is_empty() => value,
            _ => caps[0].to_string(),
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_known_variables() {
        let env = MapEnv::new().with("TEST_USER", "alice");
        assert_eq!(
            expand_env("login as %TEST_USER% now", &env),
            "login as alice now"
        );
    }

    #[test]
    fn leaves_unknown_and_empty_verbatim() {
        let env = MapEnv::new().with("EMPTY", "");
        assert_eq!(
            expand_env("%MISSING% and %EMPTY%", &env),
            "%MISSING% and %EMPTY%"
        );
    }

    #[test]
    fn ignores_lone_percent_signs() {
        let env = MapEnv::new().with("A", "x");
        assert_eq!(expand_env("50% off %A%", &env), "50% off x");
    }
}
