use crate::output::OutputFormat;
use anyhow::{Context, Result};
use clap::Args;
use sessionlens_core::content::{
    classify_content, guess_language, strip_line_numbers, ContentShape,
};
use sessionlens_runtime_config::LensConfig;
use std::path::PathBuf;

#[derive(Debug, Clone, Args)]
pub struct InspectArgs {
    /// Text payload to classify.
    pub file: PathBuf,
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
}

pub fn run(args: InspectArgs, config: &LensConfig) -> Result<()> {
    let text = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let payload = inspect_text(&text);

    match OutputFormat::resolve(args.format, &config.output) {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&payload)?),
        OutputFormat::Text => {
            println!("shape: {}", payload["shape"].as_str().unwrap_or_default());
            println!(
                "language: {}",
                payload["language"].as_str().unwrap_or_default()
            );
            println!("lines: {}", payload["lines"].as_u64().unwrap_or_default());
        }
    }
    Ok(())
}

/// Numbered listings are classified by their content, not their gutter.
fn inspect_text(text: &str) -> serde_json::Value {
    let shape = classify_content(text);
    let language = if shape == ContentShape::LineNumbered {
        guess_language(&strip_line_numbers(text))
    } else {
        guess_language(text)
    };
    serde_json::json!({
        "shape": shape,
        "language": language.as_str(),
        "lines": text.lines().count(),
    })
}
