// Copyright 2026 Bazaar Assistant Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use bazaar_core::EntityKind;
use bazaar_ingest::cli::{self, output::Output, pipeline_cmd::PipelineOptions};
use bazaar_ingest::config::IngestConfig;
use bazaar_ingest::pipeline::Mode;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "bazaar-ingest",
    about = "Bazaar ingest: scrape reference data into checkpoints and SQLite",
    version,
    after_help = "Run 'bazaar-ingest <command> --help' for details on each command."
)]
struct Cli {
    /// Output results as JSON (machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Emit log lines as JSON on stderr
    #[arg(long, global = true)]
    log_json: bool,

    /// Directory for JSON checkpoint artifacts
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct Selection {
    /// Entity types to process, comma separated (hero,item,skill,monster,merchant)
    #[arg(long, value_delimiter = ',')]
    only: Vec<EntityKind>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape, checkpoint, and import every selected entity type
    Run {
        #[command(flatten)]
        selection: Selection,
        /// Import into a throwaway in-memory store
        #[arg(long)]
        dry_run: bool,
        /// Skip the headless browser; rendered-site steps scrape nothing
        #[arg(long)]
        http_only: bool,
    },
    /// Scrape and write checkpoint artifacts only
    Scrape {
        #[command(flatten)]
        selection: Selection,
        /// Skip the headless browser; rendered-site steps scrape nothing
        #[arg(long)]
        http_only: bool,
    },
    /// Import existing checkpoint artifacts into the database
    Import {
        #[command(flatten)]
        selection: Selection,
        /// Import into a throwaway in-memory store
        #[arg(long)]
        dry_run: bool,
    },
    /// Fetch one wiki page and show how it would be extracted
    Inspect {
        /// Wiki page path (e.g. "Vanessa_Items")
        page: String,
    },
    /// Check environment and diagnose issues
    Doctor,
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: Shell,
    },
}

fn init_tracing(verbose: bool, quiet: bool, json: bool) {
    let default = if verbose {
        "bazaar_ingest=debug,bazaar_core=debug"
    } else if quiet {
        "bazaar_ingest=warn"
    } else {
        "bazaar_ingest=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet, cli.log_json);

    let out = Output::new(cli.json, cli.quiet);
    let mut config = IngestConfig::from_env();
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    let result = match cli.command {
        Commands::Run {
            selection,
            dry_run,
            http_only,
        } => {
            let opts = PipelineOptions {
                mode: Mode::Run,
                only: selection.only,
                dry_run,
                http_only,
            };
            run_pipeline(&config, &opts, &out).await
        }
        Commands::Scrape {
            selection,
            http_only,
        } => {
            let opts = PipelineOptions {
                mode: Mode::ScrapeOnly,
                only: selection.only,
                dry_run: false,
                http_only,
            };
            run_pipeline(&config, &opts, &out).await
        }
        Commands::Import { selection, dry_run } => {
            let opts = PipelineOptions {
                mode: Mode::ImportOnly,
                only: selection.only,
                dry_run,
                http_only: true,
            };
            run_pipeline(&config, &opts, &out).await
        }
        Commands::Inspect { page } => cli::inspect_cmd::run(&config, &page, &out).await,
        Commands::Doctor => cli::doctor::run(&config, &out).await,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "bazaar-ingest", &mut std::io::stdout());
            Ok(())
        }
    };

    // Consistent exit codes: 0=success, 1=error or nothing persisted
    if let Err(e) = &result {
        if out.is_json() {
            cli::output::print_json(&serde_json::json!({
                "error": true,
                "message": format!("{e:#}"),
            }));
        } else if !out.quiet {
            eprintln!("  Error: {e:#}");
        }
        std::process::exit(1);
    }

    result
}

async fn run_pipeline(config: &IngestConfig, opts: &PipelineOptions, out: &Output) -> Result<()> {
    config.validate()?;
    if !cli::pipeline_cmd::run(config, opts, out).await? {
        std::process::exit(1);
    }
    Ok(())
}
