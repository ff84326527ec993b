//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod fetch;
mod init;
mod runs;
mod source;
mod websites;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::config::Settings;
use crate::scrapers::StrategyKind;

use fetch::StrategyArg;

#[derive(Parser)]
#[command(name = "feedacquire")]
#[command(about = "RSS and HTML article ingestion")]
#[command(version)]
pub struct Cli {
    /// Config file path (defaults to feedacquire.toml in the data directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// Fetch new articles from one source or all enabled sources
    Fetch {
        /// Source ID to fetch
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        source_id: Option<String>,
        /// Fetch every enabled source
        #[arg(long)]
        all: bool,
        /// Maximum items considered per source (overrides config)
        #[arg(short = 'n', long)]
        article_limit: Option<usize>,
        /// Force a scraping strategy for HTML sources
        #[arg(short, long, value_enum)]
        strategy: Option<StrategyArg>,
        /// Run without writing articles, sources or run logs to the database
        #[arg(long)]
        dry_run: bool,
    },

    /// Manage content sources
    Source {
        #[command(subcommand)]
        command: SourceCommands,
    },

    /// Show recent fetch runs
    Runs {
        /// Number of runs to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// List configured website scraping configs
    Websites,
}

#[derive(Subcommand)]
enum SourceCommands {
    /// List configured sources
    List,
    /// Add or replace a source
    Add {
        /// Unique source ID
        id: String,
        /// Display name
        name: String,
        /// Feed or page URL
        url: String,
        /// Source type (rss or html)
        #[arg(short = 't', long = "type", default_value = "rss")]
        kind: String,
        /// Website scraping config ID (html sources)
        #[arg(short, long)]
        website: Option<String>,
        /// Always use this strategy for the source (lightweight or enhanced)
        #[arg(short, long)]
        strategy: Option<StrategyKind>,
        /// Add the source disabled
        #[arg(long)]
        disabled: bool,
    },
    /// Enable a source
    Enable {
        /// Source ID
        id: String,
    },
    /// Disable a source
    Disable {
        /// Source ID
        id: String,
    },
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;

    match cli.command {
        Commands::Init => init::cmd_init(&settings).await,
        Commands::Fetch {
            source_id,
            all: _,
            article_limit,
            strategy,
            dry_run,
        } => {
            let options = fetch::FetchOptions {
                article_limit,
                strategy,
                dry_run,
            };
            fetch::cmd_fetch(&settings, source_id.as_deref(), options).await
        }
        Commands::Source { command } => match command {
            SourceCommands::List => source::cmd_source_list(&settings).await,
            SourceCommands::Add {
                id,
                name,
                url,
                kind,
                website,
                strategy,
                disabled,
            } => {
                let new_source = source::NewSourceArgs {
                    id,
                    name,
                    url,
                    kind,
                    website,
                    strategy,
                    enabled: !disabled,
                };
                source::cmd_source_add(&settings, new_source).await
            }
            SourceCommands::Enable { id } => {
                source::cmd_source_set_enabled(&settings, &id, true).await
            }
            SourceCommands::Disable { id } => {
                source::cmd_source_set_enabled(&settings, &id, false).await
            }
        },
        Commands::Runs { limit } => runs::cmd_runs(&settings, limit).await,
        Commands::Websites => websites::cmd_websites(&settings).await,
    }
}
