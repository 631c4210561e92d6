use anyhow::Result;
use clap::Args;
use rule_translator::{Candidate, ConfigIssue, Translation};
use serde::Serialize;

use super::context::CliContext;
use super::output::{print_structured, OutputFormat};

#[derive(Args, Clone, Debug)]
pub struct TranslateArgs {
    /// Step text, exactly as it would appear in a scenario
    pub text: String,
}

#[derive(Serialize)]
struct TranslatePreview<'a> {
    input: &'a str,
    translation: Option<Translation>,
    error: Option<String>,
    candidates: Vec<Candidate>,
    issues: Vec<ConfigIssue>,
}

/// Always prints structured output; human mode falls back to JSON.
pub async fn cmd_translate(args: TranslateArgs, ctx: &CliContext) -> Result<bool> {
    let translator = ctx.translator();
    let (translation, error) = match translator.translate(&args.text) {
        Ok(translation) => (Some(translation), None),
        Err(err) => (None, Some(err.to_string())),
    };
    let preview = TranslatePreview {
        input: &args.text,
        candidates: translator.candidates(&args.text),
        issues: translator.issues(),
        translation,
        error,
    };
    let format = match ctx.output() {
        OutputFormat::Human => OutputFormat::Json,
        other => other,
    };
    print_structured(&preview, format)?;
    Ok(preview.error.is_none())
}
