use crate::config::timeline_config;
use crate::output::{render_item_line, OutputFormat};
use anyhow::{Context, Result};
use clap::Args;
use sessionlens_core::hooks::{adapt_hook_events, sort_hook_records};
use sessionlens_core::load::{read_hook_records, read_live_events, read_session_records};
use sessionlens_core::timeline::filter_by_categories;
use sessionlens_core::{
    build_timeline, merge_events, normalize_records, tally_categories, Category, NormalizedEvent,
    TimelineItem,
};
use sessionlens_runtime_config::LensConfig;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Where the events come from.
#[derive(Debug, Clone, Args)]
pub struct SourceArgs {
    /// Session records (JSON array or JSONL).
    pub file: PathBuf,
    /// Hook-callback records to splice in by time.
    #[arg(long)]
    pub hooks: Option<PathBuf>,
    /// FILE holds live-stream events instead of session records.
    #[arg(long)]
    pub live: bool,
}

#[derive(Debug, Clone, Args)]
pub struct TimelineArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Only show actions in these categories (repeatable). Turns are always shown.
    #[arg(long = "category", value_name = "CATEGORY")]
    pub categories: Vec<Category>,
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
}

#[derive(Debug, Clone, Args)]
pub struct TallyArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(BufReader::new(file))
}

fn load_events(source: &SourceArgs) -> Result<Vec<NormalizedEvent>> {
    let primary: Vec<NormalizedEvent> = if source.live {
        read_live_events(open(&source.file)?)
            .with_context(|| format!("Failed to read live events from {}", source.file.display()))?
            .into_iter()
            .map(NormalizedEvent::from)
            .collect()
    } else {
        let records = read_session_records(open(&source.file)?).with_context(|| {
            format!("Failed to read session records from {}", source.file.display())
        })?;
        normalize_records(records)
    };

    let hooks = match &source.hooks {
        Some(path) => {
            let mut records = read_hook_records(open(path)?)
                .with_context(|| format!("Failed to read hook records from {}", path.display()))?;
            sort_hook_records(&mut records);
            adapt_hook_events(&records)
        }
        None => Vec::new(),
    };

    tracing::debug!(
        primary = primary.len(),
        hooks = hooks.len(),
        "events loaded"
    );
    Ok(merge_events(primary, hooks))
}

pub fn load_timeline(source: &SourceArgs, config: &LensConfig) -> Result<Vec<TimelineItem>> {
    let events = load_events(source)?;
    Ok(build_timeline(events, &timeline_config(&config.timeline)))
}

pub fn run_timeline(args: TimelineArgs, config: &LensConfig) -> Result<()> {
    let items = load_timeline(&args.source, config)?;
    let selected: BTreeSet<Category> = args.categories.iter().copied().collect();
    let shown = filter_by_categories(&items, &selected);

    match OutputFormat::resolve(args.format, &config.output) {
        OutputFormat::Json => {
            let payload = serde_json::json!({
                "items": shown,
                "tally": tally_categories(&items),
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        OutputFormat::Text => {
            for item in shown {
                println!("{}", render_item_line(item, config.output.show_timestamps));
            }
        }
    }
    Ok(())
}

pub fn run_tally(args: TallyArgs, config: &LensConfig) -> Result<()> {
    let items = load_timeline(&args.source, config)?;
    let counts = tally_categories(&items);

    match OutputFormat::resolve(args.format, &config.output) {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&counts)?),
        OutputFormat::Text => print_tally(&counts),
    }
    Ok(())
}

fn print_tally(counts: &BTreeMap<Category, usize>) {
    for (category, count) in counts {
        println!("{:<13} {count}", category.as_str());
    }
    println!("{:<13} {}", "total", counts.values().sum::<usize>());
}
