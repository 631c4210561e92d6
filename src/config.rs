use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use rule_translator::CORE_FILE;
use serde::{Deserialize, Serialize};
use text_tester_core_types::EnvProvider;
use tracing::warn;

pub const CONFIG_DIR_ENV: &str = "TEXT_TESTER_CONFIG_DIR";
pub const STRICT_ENV: &str = "TEXT_TESTER_STRICT";
pub const SESSION_ENDPOINT_ENV: &str = "TEXT_TESTER_SESSION_ENDPOINT";

pub const DEFAULT_CONFIG_DIR: &str = "config";
pub const DEFAULT_SCENARIOS_DIR: &str = "tests/scenarios";
pub const DEFAULT_CACHE_FILE: &str = ".text-tester-cache.json";

/// `execution` section of `core.yaml`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecutionConfig {
    pub step_timeout_ms: u64,
    pub cache_dir: PathBuf,
    pub session_endpoint: Option<String>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            step_timeout_ms: 120_000,
            cache_dir: PathBuf::from("cache"),
            session_endpoint: None,
        }
    }
}

impl ExecutionConfig {
    /// `stepTimeoutMs: 0` disables the per-step timeout.
    pub fn step_timeout(&self) -> Option<Duration> {
        (self.step_timeout_ms > 0).then(|| Duration::from_millis(self.step_timeout_ms))
    }
}

#[derive(Debug, Default, Deserialize)]
struct CoreFile {
    #[serde(default)]
    execution: ExecutionConfig,
}

/// Everything the CLI resolved from flags, environment and `core.yaml`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AppSettings {
    pub config_dir: PathBuf,
    pub scenarios_dir: PathBuf,
    pub cache_file: PathBuf,
    pub execution: ExecutionConfig,
    /// Environment override for `translation.strict`.
    pub strict_override: Option<bool>,
}

impl AppSettings {
    pub fn resolve(
        config_dir: Option<&Path>,
        scenarios_dir: Option<&Path>,
        cache_file: Option<&Path>,
        env: &dyn EnvProvider,
    ) -> Result<Self> {
        let config_dir = config_dir
            .map(Path::to_path_buf)
            .or_else(|| env.get(CONFIG_DIR_ENV).filter(|v| !v.is_empty()).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR));

        let mut execution = load_execution_config(&config_dir)?;
        if let Some(endpoint) = env.get(SESSION_ENDPOINT_ENV).filter(|v| !v.is_empty()) {
            execution.session_endpoint = Some(endpoint);
        }
        let strict_override = env.get(STRICT_ENV).and_then(|raw| match parse_bool(&raw) {
            Some(value) => Some(value),
            None => {
                warn!(value = %raw, "ignoring {STRICT_ENV}; expected true or false");
                None
            }
        });

        Ok(Self {
            config_dir,
            scenarios_dir: scenarios_dir
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SCENARIOS_DIR)),
            cache_file: cache_file
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_FILE)),
            execution,
            strict_override,
        })
    }
}

/// A missing `core.yaml` yields defaults; a malformed one is an error.
pub fn load_execution_config(config_dir: &Path) -> Result<ExecutionConfig> {
    let path = config_dir.join(CORE_FILE);
    if !path.exists() {
        return Ok(ExecutionConfig::default());
    }
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    if raw.trim().is_empty() {
        return Ok(ExecutionConfig::default());
    }
    let core: CoreFile = serde_yaml::from_str(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(core.execution)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use text_tester_core_types::MapEnv;

    #[test]
    fn defaults_without_flags_or_files() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let env = MapEnv::new().with(CONFIG_DIR_ENV, tmp.path().to_string_lossy());
        let settings = AppSettings::resolve(None, None, None, &env).expect("settings");
        assert_eq!(settings.config_dir, tmp.path());
        assert_eq!(settings.scenarios_dir, PathBuf::from(DEFAULT_SCENARIOS_DIR));
        assert_eq!(settings.cache_file, PathBuf::from(DEFAULT_CACHE_FILE));
        assert_eq!(settings.execution, ExecutionConfig::default());
        assert_eq!(settings.strict_override, None);
    }

    #[test]
    fn reads_execution_section_and_env_overrides() {
        let tmp = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            tmp.path().join(CORE_FILE),
            "translation:\n  delimiter: tilde\nexecution:\n  stepTimeoutMs: 5000\n  sessionEndpoint: http://file.test\n",
        )
        .expect("write core");
        let env = MapEnv::new()
            .with(SESSION_ENDPOINT_ENV, "http://env.test")
            .with(STRICT_ENV, "TRUE");
        let settings = AppSettings::resolve(Some(tmp.path()), None, None, &env).expect("settings");
        assert_eq!(settings.execution.step_timeout_ms, 5000);
        assert_eq!(settings.execution.cache_dir, PathBuf::from("cache"));
        assert_eq!(
            settings.execution.session_endpoint.as_deref(),
            Some("http://env.test")
        );
        assert_eq!(settings.strict_override, Some(true));
    }

    #[test]
    fn flag_beats_environment_for_config_dir() {
        let env = MapEnv::new().with(CONFIG_DIR_ENV, "/from/env");
        let settings =
            AppSettings::resolve(Some(Path::new("/from/flag")), None, None, &env).expect("settings");
        assert_eq!(settings.config_dir, PathBuf::from("/from/flag"));
    }

    #[test]
    fn invalid_strict_value_is_ignored() {
        let env = MapEnv::new()
            .with(CONFIG_DIR_ENV, "/nonexistent")
            .with(STRICT_ENV, "sometimes");
        let settings = AppSettings::resolve(None, None, None, &env).expect("settings");
        assert_eq!(settings.strict_override, None);
    }

    #[test]
    fn zero_timeout_disables_limit() {
        let execution = ExecutionConfig {
            step_timeout_ms: 0,
            ..ExecutionConfig::default()
        };
        assert_eq!(execution.step_timeout(), None);
    }
}
