//! snapcheck CLI - Main Entry Point
//!
//! Runs visual regression cases against an HTTP-served site, manages
//! baselines, and opens run reports.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use snapcheck_core::{BaselineStore, HarnessConfig};
use snapcheck_harness::{report, Browser, Orchestrator, PlaywrightEngine};

mod output;

use output::OutputFormat;

/// Visual regression harness for HTTP-served pages
#[derive(Parser)]
#[command(name = "snapcheck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the config file
    #[arg(long, default_value = "snapcheck.toml", global = true)]
    config: PathBuf,

    /// Override the configured base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Browser to drive (chromium, firefox, webkit)
    #[arg(long, default_value = "chromium", global = true)]
    browser: String,

    /// Output format for summaries
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run cases and compare against baselines
    Run {
        /// Case name substring or tag to select
        pattern: Option<String>,

        /// Do not open the report on failure
        #[arg(long)]
        no_open: bool,

        /// Override the configured worker count
        #[arg(long)]
        workers: Option<usize>,

        /// Run the browser with a visible window
        #[arg(long)]
        headed: bool,
    },

    /// Open the last generated report
    ShowReport,

    /// Re-capture matching cases and overwrite their baselines
    UpdateBaselines {
        /// Case name substring or tag to select
        pattern: Option<String>,
    },

    /// List persisted baselines
    ListBaselines,
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    // 0: everything passed (baseline creation included)
    // 1: at least one case Failed or Errored
    // 2: the harness could not run at all
    match rt.block_on(run(cli)) {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    }
}

async fn run(cli: Cli) -> Result<bool> {
    let mut config = load_config(&cli)?;
    if let Some(base_url) = cli.base_url.clone() {
        config.base_url = Some(base_url);
    }

    match cli.command {
        Commands::Run {
            pattern,
            no_open,
            workers,
            headed,
        } => {
            if let Some(workers) = workers {
                config.worker_count = workers;
            }
            if headed {
                config.headless = false;
            }
            let output_dir = config.output_dir.clone();

            let engine = new_engine(&cli.browser)?;
            let mut orchestrator = Orchestrator::new(config, engine)?;
            let summary = orchestrator.run(pattern.as_deref()).await?;
            orchestrator.stop_site();

            output::print_summary(&summary, cli.format);

            // The report opens automatically only when the run had failures
            if !summary.is_success() && !no_open {
                if let Some(path) = report::last_report(&output_dir) {
                    report::open_report(&path)?;
                }
            }

            Ok(summary.is_success())
        }

        Commands::ShowReport => match report::last_report(&config.output_dir) {
            Some(path) => {
                report::open_report(&path)?;
                println!("Opened {}", path.display());
                Ok(true)
            }
            None => {
                eprintln!(
                    "No report found under {}; run `snapcheck run` first",
                    config.output_dir.display()
                );
                Ok(false)
            }
        },

        Commands::UpdateBaselines { pattern } => {
            let engine = new_engine(&cli.browser)?;
            let mut orchestrator = Orchestrator::new(config, engine)?;
            let updated = orchestrator.update_baselines(pattern.as_deref()).await?;
            orchestrator.stop_site();

            for name in &updated {
                println!("updated {}", name);
            }
            println!("{} baseline(s) updated", updated.len());
            Ok(true)
        }

        Commands::ListBaselines => {
            let store = BaselineStore::open(config.snapshot_dir())?;
            output::print_baselines(&store.list()?, cli.format);
            Ok(true)
        }
    }
}

fn load_config(cli: &Cli) -> Result<HarnessConfig> {
    if cli.config.exists() {
        let config = HarnessConfig::from_file(&cli.config)
            .with_context(|| format!("loading {}", cli.config.display()))?;
        tracing::debug!("loaded config from {}", cli.config.display());
        Ok(config)
    } else if cli.config == PathBuf::from("snapcheck.toml") {
        // The default path may simply not exist yet; flags and defaults
        // still make a usable run
        Ok(HarnessConfig::default())
    } else {
        anyhow::bail!("config file not found: {}", cli.config.display());
    }
}

fn new_engine(browser: &str) -> Result<Arc<PlaywrightEngine>> {
    let browser = match browser {
        "firefox" => Browser::Firefox,
        "webkit" => Browser::Webkit,
        _ => Browser::Chromium,
    };
    Ok(Arc::new(PlaywrightEngine::new(browser)?))
}
