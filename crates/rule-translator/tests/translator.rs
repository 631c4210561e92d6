use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;

use rule_translator::{
    render_template, template_placeholders, ActionType, Params, RuleSource, Translation,
    Translator, TranslatorOptions, CORE_FILE, RULES_FILE,
};
use text_tester_core_types::MapEnv;

const CORE: &str = r#"
translation:
  delimiter: tilde
  paramPatterns:
    url: "^https?://[^\\s]+$"
    seconds: "^\\d+$"
"#;

const RULES: &str = r#"
rules:
  - name: open_page
    patterns:
      - "open~{url}"
      - "go to~{url}"
    template: "act: navigate to {url}"
    validation:
      required: [url]
  - name: click
    patterns:
      - "click {target}"
    template: "act: click {target}"
  - name: click_button
    patterns:
      - "click {target} button"
    template: "act: click the {target} button"
  - name: wait
    patterns:
      - "wait~{seconds}~seconds"
    template: "wait({seconds})"
  - name: read_price
    patterns:
      - "read the price of {item}"
    template: "extract: the price of {item}"
    validation:
      required: [item]
"#;

fn write_config(dir: &Path, rules: &str) {
    fs::write(dir.join(CORE_FILE), CORE).unwrap();
    fs::write(dir.join(RULES_FILE), rules).unwrap();
}

fn load(dir: &Path) -> Translator {
    Translator::load(
        TranslatorOptions::from_config_dir(dir)
            .with_env(Arc::new(MapEnv::new().with("SITE", "https://shop.test"))),
    )
}

#[test]
fn delimiter_patterns_accept_their_own_family_and_reject_missing_literals() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), RULES);
    let translator = load(dir.path());
    assert!(translator.issues().is_empty(), "{:?}", translator.issues());

    let hit = translator.translate("wait 5 seconds").unwrap();
    assert_eq!(hit.as_rules().map(|r| r.rule.as_str()), Some("wait"));
    assert_eq!(hit.code(), "wait(5)");

    let compact = translator.translate("wait 5seconds").unwrap();
    assert_eq!(compact.engine(), "rules");

    let missing_literal = translator.translate("wait 5").unwrap();
    assert_eq!(missing_literal.engine(), "agent");

    let constrained = translator.translate("wait five seconds").unwrap();
    assert_eq!(constrained.engine(), "agent");
}

#[test]
fn declaration_order_decides_precedence() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), RULES);
    let translator = load(dir.path());

    let translation = translator.translate("click checkout button").unwrap();
    let rules = translation.as_rules().unwrap();
    assert_eq!(rules.rule, "click");
    assert_eq!(rules.code, "act: click checkout button");

    let candidates: Vec<_> = translator
        .candidates("click checkout button")
        .into_iter()
        .map(|c| c.rule)
        .collect();
    assert_eq!(candidates, vec!["click", "click_button"]);
}

#[test]
fn translating_twice_is_identical() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), RULES);
    let translator = load(dir.path());
    for text in ["open %SITE%/cart", "read the price of tea", "do something clever"] {
        let first = translator.translate(text).unwrap();
        let second = translator.translate(text).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn env_placeholders_expand_before_matching() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), RULES);
    let translator = load(dir.path());

    let translation = translator.translate("go to %SITE%/login").unwrap();
    let rules = translation.as_rules().unwrap();
    assert_eq!(rules.pattern.as_str(), "go to~{url}");
    assert_eq!(rules.code, "act: navigate to https://shop.test/login");

    // Unresolved placeholders stay verbatim and fail the url constraint.
    let unresolved = translator.translate("open %NOPE%").unwrap();
    assert_eq!(unresolved.engine(), "agent");
    assert_eq!(unresolved.action(), "open %NOPE%");
}

#[test]
fn extract_templates_are_typed_extract() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), RULES);
    let translator = load(dir.path());
    let translation = translator.translate("read the price of green tea").unwrap();
    assert_eq!(translation.action_type(), ActionType::Extract);
}

#[test]
fn rendering_with_required_names_leaves_no_placeholders() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), RULES);
    let translator = load(dir.path());
    let book = translator.snapshot();
    for rule in book.rules.rules() {
        let params: Params = template_placeholders(&rule.template)
            .into_iter()
            .map(|name| (name, Some("value".to_string())))
            .collect();
        let rendered = render_template(&rule.template, &params);
        assert!(
            template_placeholders(&rendered).is_empty(),
            "{} rendered to {}",
            rule.name,
            rendered
        );
    }
}

#[test]
fn missing_rules_file_means_agent_only() {
    let dir = tempfile::tempdir().unwrap();
    let translator = load(dir.path());
    assert_eq!(translator.rule_count(), 0);
    assert!(translator.issues().is_empty());
    assert!(matches!(
        translator.translate("open https://a.test").unwrap(),
        Translation::Agent(_)
    ));
}

#[test]
fn unparseable_rules_degrade_to_agent_only() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), "rules: [unclosed");
    let translator = load(dir.path());
    assert_eq!(translator.rule_count(), 0);
    assert_eq!(translator.issues().len(), 1);
    assert_eq!(translator.translate("click ok").unwrap().engine(), "agent");
}

#[test]
fn reload_swaps_in_the_new_rule_set() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), RULES);
    let translator = load(dir.path());
    assert_eq!(translator.rule_count(), 5);

    fs::write(
        dir.path().join(RULES_FILE),
        "rules:\n  - name: only\n    patterns: ['click {target}']\n    template: 'tap({target})'\n",
    )
    .unwrap();
    let summary = translator.reload();
    assert_eq!(summary.rules, 1);
    assert!(summary.issues.is_empty());
    assert_eq!(translator.translate("click ok").unwrap().code(), "tap(ok)");
}

#[test]
fn readers_never_observe_a_partial_rule_set() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), RULES);
    let translator = Arc::new(load(dir.path()));
    let alternate = "rules:\n  - name: click\n    patterns: ['click {target}']\n    template: 'tap({target})'\n";

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let translator = Arc::clone(&translator);
            thread::spawn(move || {
                for _ in 0..200 {
                    let book = translator.snapshot();
                    let count = book.rules.len();
                    assert!(count == 5 || count == 1, "saw {count} rules");
                    let code = translator.translate("click ok").unwrap().code().to_string();
                    assert!(code == "act: click ok" || code == "tap(ok)", "{code}");
                }
            })
        })
        .collect();

    for round in 0..20 {
        let rules = if round % 2 == 0 { alternate } else { RULES };
        fs::write(dir.path().join(RULES_FILE), rules).unwrap();
        translator.reload();
    }

    for reader in readers {
        reader.join().unwrap();
    }
}

#[test]
fn inline_source_supports_pipe_convention() {
    let translation = rule_translator::CoreTranslationConfig {
        delimiter: rule_translator::SegmentDelimiter::Pipe,
        ..Default::default()
    };
    let rule = rule_translator::RuleSpec::new("search", "act: search for {query}")
        .with_pattern("search|{query}");
    let translator = Translator::load(TranslatorOptions::new(RuleSource::inline(
        vec![rule],
        translation,
    )));
    let result = translator.translate("search rust books").unwrap();
    assert_eq!(result.code(), "act: search for rust books");
}
