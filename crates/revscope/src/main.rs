//! revscope - inspect version diffs and file trees.
//!
//! This is the main entry point for the revscope CLI. It runs the diff parser
//! and tree builder over local files; it never talks to a versioning backend.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use revscope_core::HistoryConfig;
use revscope_util::{LogConfig, LogLevel};

#[derive(Parser)]
#[command(name = "revscope")]
#[command(author, version, about = "Inspect version diffs and file trees", long_about = None)]
struct Cli {
    /// Enable debug logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a unified diff and print its hunks
    Parse {
        /// File containing the raw diff ("-" for stdin)
        diff: PathBuf,

        /// JSON file with per-file stats: [{"path", "additions", "deletions"}]
        #[arg(short, long)]
        stats: Option<PathBuf>,

        /// Print hunks as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build a file tree from a list of paths, one per line
    Tree {
        /// File containing the paths ("-" for stdin)
        paths: PathBuf,

        /// Print display rows as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration
    Config {
        /// Project directory to read revscope.json from
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
}

/// `--verbose` forces debug output; otherwise the configured level applies.
fn log_level(verbose: bool, config: &HistoryConfig) -> LogLevel {
    if verbose {
        LogLevel::Debug
    } else {
        config.log_level()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cwd = std::env::current_dir()?;
    let project_dir = match &cli.command {
        Commands::Config { dir: Some(dir) } => dir.clone(),
        _ => cwd,
    };
    let (config, sources) = HistoryConfig::load(Some(&project_dir)).await?;

    revscope_util::log::init(LogConfig {
        include_location: cli.verbose,
        ..LogConfig::stderr(log_level(cli.verbose, &config))
    });
    tracing::debug!(?sources, "Configuration loaded");

    match cli.command {
        Commands::Parse { diff, stats, json } => {
            commands::parse(&diff, stats.as_deref(), json).await
        }
        Commands::Tree { paths, json } => commands::tree(&paths, json).await,
        Commands::Config { .. } => commands::show_config(&config, &sources),
    }
}
