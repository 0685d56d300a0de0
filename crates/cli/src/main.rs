mod config;
mod inspect;
mod output;
mod threads_cmd;
mod timeline_cmd;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "sessionlens",
    about = "Build ordered, paired action timelines from agent session logs"
)]
struct Cli {
    /// Read configuration from this file instead of ~/.config/sessionlens/sessionlens.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log recoverable anomalies (dropped outcomes, unknown roles) to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the action timeline of a session
    Timeline(timeline_cmd::TimelineArgs),

    /// Count timeline actions per category
    Tally(timeline_cmd::TallyArgs),

    /// Show indentation levels for records linked by parent id
    Threads(threads_cmd::ThreadsArgs),

    /// Classify the shape and language of a text payload
    Inspect(inspect::InspectArgs),
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = config::load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Timeline(args) => timeline_cmd::run_timeline(args, &config),
        Commands::Tally(args) => timeline_cmd::run_tally(args, &config),
        Commands::Threads(args) => threads_cmd::run(args, &config),
        Commands::Inspect(args) => inspect::run(args, &config),
    });

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
