use assert_cmd::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::Command;

const CORE: &str = r#"
translation:
  delimiter: tilde
  paramPatterns:
    url: "^https?://[^\\s]+$"
    qty: "^\\d*$"
execution:
  stepTimeoutMs: 5000
  cacheDir: cache
"#;

const RULES: &str = r#"
rules:
  - name: open_page
    patterns:
      - "open~{url}"
    template: "act: navigate to {url}"
    validation:
      required: [url]
  - name: click
    patterns:
      - "click {target}"
    template: "act: click {target}"
  - name: add_items
    patterns:
      - "add {qty} items"
    template: "act: add {qty} items"
    validation:
      required: [qty]
"#;

const LOGIN: &str = r#"## Log in
# start at the home page
open https://shop.test/
click login # header link
"+"
fill the form:
  user: ada
"-"
"#;

struct Workspace {
    dir: tempfile::TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = dir.path().join("config");
        fs::create_dir_all(&config).expect("config dir");
        fs::write(config.join("core.yaml"), CORE).expect("core.yaml");
        fs::write(config.join("translation-rules.yaml"), RULES).expect("rules");
        let scenarios = dir.path().join("tests/scenarios");
        fs::create_dir_all(&scenarios).expect("scenarios dir");
        fs::write(scenarios.join("login.txt"), LOGIN).expect("scenario");
        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn command(&self) -> Command {
        let bin = assert_cmd::cargo::cargo_bin!("text-tester");
        let mut cmd = Command::new(bin);
        cmd.current_dir(self.path())
            .env_remove("TEXT_TESTER_CONFIG_DIR")
            .env_remove("TEXT_TESTER_STRICT")
            .env_remove("TEXT_TESTER_SESSION_ENDPOINT")
            .env_remove("RUST_LOG");
        cmd
    }
}

fn stdout_json(output: &std::process::Output) -> Value {
    let stdout = String::from_utf8(output.stdout.clone()).expect("utf8 output");
    serde_json::from_str(&stdout).expect("valid json")
}

#[test]
fn translate_previews_rule_match() {
    let ws = Workspace::new();
    let assert = ws
        .command()
        .args(["translate", "click checkout"])
        .assert()
        .success();
    let value = stdout_json(assert.get_output());
    assert_eq!(value["translation"]["engine"], "rules");
    assert_eq!(value["translation"]["rule"], "click");
    assert_eq!(value["translation"]["code"], "act: click checkout");
    assert_eq!(value["translation"]["params"]["target"], "checkout");
    assert_eq!(value["candidates"].as_array().map(Vec::len), Some(1));
}

#[test]
fn translate_falls_back_to_agent() {
    let ws = Workspace::new();
    let assert = ws
        .command()
        .args(["translate", "scroll to the footer"])
        .assert()
        .success();
    let value = stdout_json(assert.get_output());
    assert_eq!(value["translation"]["engine"], "agent");
    assert_eq!(value["translation"]["action"], "scroll to the footer");
}

#[test]
fn parse_dumps_cases_and_stats() {
    let ws = Workspace::new();
    let assert = ws
        .command()
        .args(["parse", "tests/scenarios/login.txt"])
        .assert()
        .success();
    let value = stdout_json(assert.get_output());
    assert_eq!(value["workflow"], "login-flow");
    assert_eq!(value["cases"][0]["name"], "Log in");
    assert_eq!(value["cases"][0]["steps"][0]["comment"], "start at the home page");
    assert_eq!(value["cases"][0]["steps"][1]["comment"], "header link");
    assert_eq!(value["stats"]["steps"], 3);
    assert_eq!(value["stats"]["multiline_steps"], 1);
}

#[test]
fn config_validate_accepts_good_config() {
    let ws = Workspace::new();
    ws.command()
        .args(["config", "validate"])
        .assert()
        .success();
}

#[test]
fn config_validate_reports_every_problem() {
    let ws = Workspace::new();
    fs::write(
        ws.path().join("config/translation-rules.yaml"),
        "rules:\n  - name: legacy\n    patterns: [\"open|{url}\"]\n    template: \"go {url}\"\n  - name: broken\n    patterns: [\"click {x}\"]\n",
    )
    .expect("rules");
    let assert = ws
        .command()
        .args(["config", "validate"])
        .assert()
        .code(1);
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    assert!(stdout.contains("2 problem(s)"), "stdout: {stdout}");
    assert!(stdout.contains("legacy"));
    assert!(stdout.contains("broken"));
}

#[test]
fn dry_run_passes_and_reports_json() {
    let ws = Workspace::new();
    let assert = ws
        .command()
        .args(["--output", "json", "run", "--dry-run"])
        .assert()
        .success();
    let value = stdout_json(assert.get_output());
    let report = &value[0];
    assert_eq!(report["workflow"], "login-flow");
    assert_eq!(report["stats"]["passed"], 1);
    assert_eq!(report["cases"][0]["steps"][0]["code"], "act: navigate to https://shop.test/");
    assert!(ws.path().join("cache/login-flow").is_dir());
}

#[test]
fn strict_mode_failure_exits_non_zero() {
    let ws = Workspace::new();
    fs::write(
        ws.path().join("tests/scenarios/cart.txt"),
        "## Cart\nadd  items\n",
    )
    .expect("scenario");
    ws.command()
        .env("TEXT_TESTER_STRICT", "true")
        .args(["run", "--dry-run", "tests/scenarios/cart.txt"])
        .assert()
        .code(1);
}

#[test]
fn changed_run_records_passing_scenarios() {
    let ws = Workspace::new();
    let listed = ws.command().args(["changed"]).assert().success();
    let stdout = String::from_utf8(listed.get_output().stdout.clone()).expect("utf8");
    assert!(stdout.contains("login.txt"));

    ws.command()
        .args(["changed", "--run", "--dry-run"])
        .assert()
        .success();
    assert!(ws.path().join(".text-tester-cache.json").exists());

    let after = ws.command().args(["changed"]).assert().success();
    let stdout = String::from_utf8(after.get_output().stdout.clone()).expect("utf8");
    assert!(stdout.contains("No changed scenarios"), "stdout: {stdout}");
}

#[test]
fn info_reports_rule_count() {
    let ws = Workspace::new();
    let assert = ws
        .command()
        .args(["--output", "json", "info"])
        .assert()
        .success();
    let value = stdout_json(assert.get_output());
    assert_eq!(value["rules"], 3);
    assert_eq!(value["scenarios"], 1);
}
