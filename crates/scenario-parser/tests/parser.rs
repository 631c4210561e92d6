use std::sync::Arc;

use scenario_parser::{determine_workflow, ScenarioParser, ScenarioStats, Step};
use text_tester_core_types::{MapEnv, WorkflowId};

const CHECKOUT: &str = r#"
Preamble text that belongs to no case.

## Add to cart
# start from the catalogue
open %SITE%/catalogue
click add to cart # the first product
wait 2 seconds

## Pay with card
open %SITE%/checkout
"+"
fill the payment form:
    number: 4242 4242 4242 4242
    expiry: 12/30
"-"
# confirm
click pay
"#;

fn parser() -> ScenarioParser {
    ScenarioParser::new(Arc::new(MapEnv::new().with("SITE", "https://shop.test")))
}

#[test]
fn comment_becomes_pending_annotation() {
    let cases = parser().parse_str("## T\n# note\nstep one\n");
    assert_eq!(cases.len(), 1);
    assert_eq!(cases[0].name, "T");
    assert_eq!(cases[0].comments, vec!["note".to_string()]);
    assert_eq!(
        cases[0].steps,
        vec![Step::new("step one").with_comment("note")]
    );
}

#[test]
fn multiline_block_preserves_indentation() {
    let cases = parser().parse_str("## T\n\"+\"\n  line a\n    line b\n\"-\"\n");
    assert_eq!(cases[0].steps.len(), 1);
    let step = &cases[0].steps[0];
    assert!(step.is_multiline);
    assert_eq!(step.action, "  line a\n    line b");
}

#[test]
fn parses_realistic_document_in_order() {
    let cases = parser().parse_str(CHECKOUT);
    let names: Vec<_> = cases.iter().map(|case| case.name.as_str()).collect();
    assert_eq!(names, vec!["Add to cart", "Pay with card"]);

    let first = &cases[0];
    let actions: Vec<_> = first.steps.iter().map(|s| s.action.as_str()).collect();
    assert_eq!(
        actions,
        vec![
            "open https://shop.test/catalogue",
            "click add to cart",
            "wait 2 seconds"
        ]
    );
    assert_eq!(
        first.steps[0].comment.as_deref(),
        Some("start from the catalogue")
    );
    assert_eq!(first.steps[1].comment.as_deref(), Some("the first product"));
    assert_eq!(first.steps[2].comment, None);

    let second = &cases[1];
    assert_eq!(second.steps.len(), 3);
    assert!(second.steps[1].is_multiline);
    assert!(second.steps[1].action.starts_with("fill the payment form:\n    number:"));
    assert_eq!(second.steps[2].action, "click pay");
    assert_eq!(second.steps[2].comment.as_deref(), Some("confirm"));
}

#[test]
fn unresolved_env_placeholders_stay_verbatim() {
    let cases = parser().parse_str("## T\nopen %MISSING%/home\n");
    assert_eq!(cases[0].steps[0].action, "open %MISSING%/home");
}

#[test]
fn document_without_cases_is_empty() {
    assert!(parser().parse_str("").is_empty());
    assert!(parser().parse_str("just prose\n\n# a comment\n").is_empty());
}

#[test]
fn unterminated_block_is_kept() {
    let cases = parser().parse_str("## T\n\"+\"\nfirst\n  second\n");
    assert_eq!(cases[0].steps.len(), 1);
    assert!(cases[0].steps[0].is_multiline);
    assert_eq!(cases[0].steps[0].action, "first\n  second");
}

#[test]
fn empty_block_emits_nothing() {
    let cases = parser().parse_str("## T\n\"+\"\n\"-\"\nafter\n");
    assert_eq!(cases[0].steps, vec![Step::new("after")]);
}

#[test]
fn parsing_is_deterministic() {
    let p = parser();
    assert_eq!(p.parse_str(CHECKOUT), p.parse_str(CHECKOUT));
}

#[test]
fn parse_file_reports_stats_and_workflow() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("Checkout.txt");
    std::fs::write(&path, CHECKOUT).expect("write scenario");

    let cache = tmp.path().join("cache");
    let workflow = determine_workflow(&path, &cache).expect("workflow");
    assert_eq!(workflow, WorkflowId::new("checkout-flow"));

    let document = parser().parse_file(&path, workflow).expect("parse");
    assert_eq!(document.path.as_deref(), Some(path.as_path()));
    assert_eq!(
        document.stats(),
        ScenarioStats {
            cases: 2,
            steps: 6,
            multiline_steps: 1
        }
    );
    assert!(document.case("Pay with card").is_some());
}

#[test]
fn parse_file_missing_path_is_error() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let err = parser()
        .parse_file(&tmp.path().join("nope.txt"), WorkflowId::default())
        .unwrap_err();
    assert!(err.to_string().contains("nope.txt"));
}

#[test]
fn document_serialises_to_json() {
    let cases = parser().parse_str("## T\nstep\n");
    let json = serde_json::to_value(&cases).expect("json");
    assert_eq!(json[0]["steps"][0]["is_multiline"], false);
    assert_eq!(json[0]["name"], "T");
}
