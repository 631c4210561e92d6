//! Loading and validating `core.yaml` / `translation-rules.yaml`.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_yaml::Value;
use tracing::debug;

use crate::errors::{ConfigError, ConfigIssue};
use crate::matcher::CompiledRule;
use crate::model::{ParamPatternLibrary, PatternSpec, Rule, RuleSpec, SegmentDelimiter};
use crate::pattern::{placeholders, PatternCompiler, RegexPatternCompiler};

pub const CORE_FILE: &str = "core.yaml";
pub const RULES_FILE: &str = "translation-rules.yaml";

/// `translation` section of `core.yaml`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoreTranslationConfig {
    #[serde(default)]
    pub param_patterns: BTreeMap<String, String>,
    #[serde(default)]
    pub delimiter: SegmentDelimiter,
    #[serde(default)]
    pub strict: bool,
}

impl CoreTranslationConfig {
    pub fn library(&self) -> ParamPatternLibrary {
        ParamPatternLibrary::from_map(self.param_patterns.iter())
    }
}

#[derive(Debug, Default, Deserialize)]
struct CoreDocument {
    #[serde(default)]
    translation: CoreTranslationConfig,
}

/// Where a translator reads its rules from.
#[derive(Clone, Debug)]
pub enum RuleSource {
    Files {
        rules_path: PathBuf,
        core_path: PathBuf,
    },
    Inline {
        rules: Vec<RuleSpec>,
        translation: CoreTranslationConfig,
    },
}

impl RuleSource {
    pub fn config_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        RuleSource::Files {
            rules_path: dir.join(RULES_FILE),
            core_path: dir.join(CORE_FILE),
        }
    }

    pub fn inline(rules: Vec<RuleSpec>, translation: CoreTranslationConfig) -> Self {
        RuleSource::Inline { rules, translation }
    }

    pub fn label(&self) -> String {
        match self {
            RuleSource::Files { rules_path, .. } => rules_path.display().to_string(),
            RuleSource::Inline { .. } => "inline".to_string(),
        }
    }

    /// Reads everything it can. Failures become issues; a missing rules file
    /// is not an issue (agent-only mode).
    pub(crate) fn read(&self) -> SourceContents {
        match self {
            RuleSource::Inline { rules, translation } => SourceContents {
                entries: rules.iter().cloned().enumerate().collect(),
                translation: translation.clone(),
                issues: Vec::new(),
            },
            RuleSource::Files {
                rules_path,
                core_path,
            } => {
                let mut issues = Vec::new();
                let translation = match load_core_config(core_path) {
                    Ok(Some(translation)) => translation,
                    Ok(None) => CoreTranslationConfig::default(),
                    Err(err) => {
                        issues.extend(err.issues());
                        CoreTranslationConfig::default()
                    }
                };
                let entries = match read_rules_file(rules_path) {
                    Ok(Some(document)) => {
                        let (entries, parse_issues) =
                            parse_rule_entries(&rules_path.display().to_string(), &document);
                        issues.extend(parse_issues);
                        entries
                    }
                    Ok(None) => {
                        debug!(path = %rules_path.display(), "no rules file; agent-only translation");
                        Vec::new()
                    }
                    Err(err) => {
                        issues.extend(err.issues());
                        Vec::new()
                    }
                };
                SourceContents {
                    entries,
                    translation,
                    issues,
                }
            }
        }
    }
}

pub(crate) struct SourceContents {
    pub entries: Vec<(usize, RuleSpec)>,
    pub translation: CoreTranslationConfig,
    pub issues: Vec<ConfigIssue>,
}

/// `Ok(None)` when the file does not exist.
pub fn load_core_config(path: &Path) -> Result<Option<CoreTranslationConfig>, ConfigError> {
    let Some(content) = read_optional(path)? else {
        return Ok(None);
    };
    if content.trim().is_empty() {
        return Ok(Some(CoreTranslationConfig::default()));
    }
    let document: CoreDocument =
        serde_yaml::from_str(&content).map_err(|err| ConfigError::yaml(path, err))?;
    Ok(Some(document.translation))
}

/// `Ok(None)` when the file does not exist.
pub fn read_rules_file(path: &Path) -> Result<Option<Value>, ConfigError> {
    let Some(content) = read_optional(path)? else {
        return Ok(None);
    };
    let value: Value = serde_yaml::from_str(&content).map_err(|err| ConfigError::yaml(path, err))?;
    Ok(Some(value))
}

fn read_optional(path: &Path) -> Result<Option<String>, ConfigError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Splits the `rules` list into typed entries, reporting entries that do not
/// deserialize.
pub fn parse_rule_entries(source: &str, document: &Value) -> (Vec<(usize, RuleSpec)>, Vec<ConfigIssue>) {
    let mut issues = Vec::new();
    let Some(list) = document.get("rules").and_then(Value::as_sequence) else {
        issues.push(ConfigIssue::file(source, "missing `rules` list"));
        return (Vec::new(), issues);
    };
    let mut entries = Vec::with_capacity(list.len());
    for (index, raw) in list.iter().enumerate() {
        let name = raw.get("name").and_then(Value::as_str);
        if !raw.is_mapping() {
            issues.push(ConfigIssue::rule(source, index, None, "rule must be a mapping"));
            continue;
        }
        match serde_yaml::from_value::<RuleSpec>(raw.clone()) {
            Ok(spec) => entries.push((index, spec)),
            Err(err) => issues.push(ConfigIssue::rule(source, index, name, format!("malformed rule: {err}"))),
        }
    }
    (entries, issues)
}

/// Field-level checks that do not need a compiler.
pub fn check_rule_spec(spec: &RuleSpec) -> Vec<String> {
    let mut problems = Vec::new();
    if spec.name.as_deref().map_or(true, |name| name.trim().is_empty()) {
        problems.push("name must be a non-empty string".to_string());
    }
    if spec.patterns.is_empty() {
        problems.push("patterns must be a non-empty list".to_string());
    }
    if spec.template.as_deref().map_or(true, |template| template.trim().is_empty()) {
        problems.push("template must be a non-empty string".to_string());
    }
    let captured: BTreeSet<String> = spec
        .patterns
        .iter()
        .flat_map(|pattern| placeholders(pattern))
        .collect();
    for required in &spec.validation.required {
        if !captured.contains(required) {
            problems.push(format!(
                "required parameter `{required}` is not captured by any pattern"
            ));
        }
    }
    problems
}

/// Validates and compiles one rule. Any problem drops the whole rule.
pub fn compile_rule_spec(
    source: &str,
    index: usize,
    spec: &RuleSpec,
    delimiter: SegmentDelimiter,
    library: &ParamPatternLibrary,
    compiler: &dyn PatternCompiler,
) -> Result<CompiledRule, Vec<ConfigIssue>> {
    let name = spec.name.as_deref();
    let mut issues: Vec<ConfigIssue> = check_rule_spec(spec)
        .into_iter()
        .map(|message| ConfigIssue::rule(source, index, name, message))
        .collect();

    let mut matchers = Vec::with_capacity(spec.patterns.len());
    for pattern in &spec.patterns {
        match compiler.compile(pattern, delimiter, library) {
            Ok(matcher) => matchers.push((PatternSpec::new(pattern.clone()), matcher)),
            Err(err) => issues.push(ConfigIssue::rule(
                source,
                index,
                name,
                format!("pattern `{pattern}`: {err}"),
            )),
        }
    }

    if !issues.is_empty() {
        return Err(issues);
    }

    let rule = Rule {
        name: name.unwrap_or_default().trim().to_string(),
        patterns: spec.patterns.iter().cloned().map(PatternSpec::new).collect(),
        template: spec.template.clone().unwrap_or_default(),
        required_params: spec.validation.required.iter().cloned().collect(),
    };
    Ok(CompiledRule::new(rule, matchers))
}

/// Full check of a configuration directory. Every problem is collected
/// before returning.
pub fn validate_config_dir(dir: &Path) -> Result<usize, ConfigError> {
    let core_path = dir.join(CORE_FILE);
    let rules_path = dir.join(RULES_FILE);
    let mut issues = Vec::new();

    let translation = match load_core_config(&core_path) {
        Ok(Some(translation)) => translation,
        Ok(None) => {
            issues.push(ConfigIssue::file(core_path.display().to_string(), "file is missing"));
            CoreTranslationConfig::default()
        }
        Err(err) => {
            issues.extend(err.issues());
            CoreTranslationConfig::default()
        }
    };
    let library = translation.library();
    let source = rules_path.display().to_string();

    let mut valid = 0;
    match read_rules_file(&rules_path) {
        Ok(Some(document)) => {
            let (entries, parse_issues) = parse_rule_entries(&source, &document);
            issues.extend(parse_issues);
            let declared = document
                .get("rules")
                .and_then(Value::as_sequence)
                .map(Vec::len);
            if declared == Some(0) {
                issues.push(ConfigIssue::file(&source, "`rules` list is empty"));
            }
            for (index, spec) in &entries {
                match compile_rule_spec(
                    &source,
                    *index,
                    spec,
                    translation.delimiter,
                    &library,
                    &RegexPatternCompiler,
                ) {
                    Ok(_) => valid += 1,
                    Err(rule_issues) => issues.extend(rule_issues),
                }
            }
        }
        Ok(None) => issues.push(ConfigIssue::file(&source, "file is missing")),
        Err(err) => issues.extend(err.issues()),
    }

    if issues.is_empty() {
        Ok(valid)
    } else {
        Err(ConfigError::Invalid(issues))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CORE: &str = r#"
translation:
  delimiter: tilde
  paramPatterns:
    url: "^https?://\\S+$"
"#;

    #[test]
    fn core_config_reads_translation_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CORE_FILE);
        fs::write(&path, CORE).unwrap();
        let translation = load_core_config(&path).unwrap().unwrap();
        assert_eq!(translation.delimiter, SegmentDelimiter::Tilde);
        assert!(!translation.strict);
        assert_eq!(translation.library().fragment("url"), Some(r"https?://\S+"));
    }

    #[test]
    fn missing_core_config_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_core_config(&dir.path().join(CORE_FILE)).unwrap().is_none());
    }

    #[test]
    fn rule_spec_checks_collect_every_problem() {
        let spec = RuleSpec {
            name: Some("  ".into()),
            patterns: vec![],
            template: None,
            validation: crate::model::ValidationSpec {
                required: vec!["url".into()],
            },
        };
        let problems = check_rule_spec(&spec);
        assert_eq!(problems.len(), 4, "{problems:?}");
    }

    #[test]
    fn malformed_entries_are_reported_by_index() {
        let document: Value = serde_yaml::from_str(
            r#"
rules:
  - name: ok
    patterns: ["open {url}"]
    template: "act: open {url}"
  - "just a string"
  - name: bad
    patterns: 3
"#,
        )
        .unwrap();
        let (entries, issues) = parse_rule_entries("rules.yaml", &document);
        assert_eq!(entries.len(), 1);
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].rule_index, Some(1));
        assert_eq!(issues[1].rule_name.as_deref(), Some("bad"));
    }

    #[test]
    fn validate_reports_all_problems_at_once() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CORE_FILE), CORE).unwrap();
        fs::write(
            dir.path().join(RULES_FILE),
            r#"
rules:
  - name: open
    patterns: ["open|{url}"]
    template: "act: open {url}"
  - patterns: ["click {target}"]
    template: "act: click {target}"
  - name: fine
    patterns: ["wait {seconds} seconds"]
    template: "wait({seconds})"
"#,
        )
        .unwrap();
        let err = validate_config_dir(dir.path()).unwrap_err();
        let issues = err.issues();
        assert_eq!(issues.len(), 2, "{issues:?}");
        assert!(issues[0].message.contains("segment delimiter"));
        assert!(issues[1].message.contains("name"));
    }

    #[test]
    fn validate_accepts_good_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CORE_FILE), CORE).unwrap();
        fs::write(
            dir.path().join(RULES_FILE),
            "rules:\n  - name: open\n    patterns: ['open {url}']\n    template: 'act: goto {url}'\n",
        )
        .unwrap();
        assert_eq!(validate_config_dir(dir.path()).unwrap(), 1);
    }

    #[test]
    fn validate_flags_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let err = validate_config_dir(dir.path()).unwrap_err();
        assert_eq!(err.issues().len(), 2);
    }
}
