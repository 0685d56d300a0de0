use crate::output::OutputFormat;
use anyhow::{Context, Result};
use clap::Args;
use sessionlens_core::load::read_records;
use sessionlens_core::thread::{build_thread_map_with_depth, ThreadNode, ThreadRecord};
use sessionlens_runtime_config::LensConfig;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Debug, Clone, Args)]
pub struct ThreadsArgs {
    /// `{id, parent_id}` records (JSON array or JSONL).
    pub file: PathBuf,
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
}

/// Thread nodes in input order, one per distinct id.
fn ordered_nodes(records: &[ThreadRecord], max_depth: usize) -> Vec<ThreadNode> {
    let mut map = build_thread_map_with_depth(records, max_depth);
    let mut seen = HashSet::new();
    records
        .iter()
        .filter_map(|record| {
            let id = record.id.as_deref()?.trim();
            if !seen.insert(id) {
                return None;
            }
            map.remove(id)
        })
        .collect()
}

pub fn run(args: ThreadsArgs, config: &LensConfig) -> Result<()> {
    let file =
        File::open(&args.file).with_context(|| format!("Failed to open {}", args.file.display()))?;
    let records: Vec<ThreadRecord> = read_records(BufReader::new(file))
        .with_context(|| format!("Failed to read thread records from {}", args.file.display()))?;
    let nodes = ordered_nodes(&records, config.timeline.thread_max_depth);

    match OutputFormat::resolve(args.format, &config.output) {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&nodes)?),
        OutputFormat::Text => {
            for node in &nodes {
                let indent = "  ".repeat(node.indent_level);
                match &node.parent_id {
                    Some(parent) if node.is_child => {
                        println!("{indent}{} (reply to {parent})", node.id)
                    }
                    _ => println!("{indent}{}", node.id),
                }
            }
        }
    }
    Ok(())
}
