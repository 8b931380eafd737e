//! terminal-scraper main entry point
//!
//! This is the command-line interface for the terminal portal scraper.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use terminal_scraper::config::{load_config_with_hash, Config};
use terminal_scraper::storage::{open_storage, Storage};
use terminal_scraper::{
    build_adapter, Credential, Fetcher, LogEvent, LogKind, Orchestrator, Portal, ScrapeRequest,
};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// terminal-scraper: scrape shipping-terminal portals
///
/// Logs into a terminal portal, fetches its pages under a rate limit and
/// prints the extracted links and tables as JSON.
#[derive(Parser, Debug)]
#[command(name = "terminal-scraper")]
#[command(version)]
#[command(about = "Scrape shipping-terminal portals", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and scrape a portal
    Scrape {
        /// Portal to scrape (t18 or etslink)
        #[arg(long)]
        portal: Portal,

        /// Portal username
        #[arg(long, env = "TERMINAL_USERNAME")]
        username: String,

        /// Portal password
        #[arg(long, env = "TERMINAL_PASSWORD", hide_env_values = true)]
        password: String,

        /// Comma-separated location codes (all known locations when omitted)
        #[arg(long, value_delimiter = ',')]
        locations: Option<Vec<String>>,

        /// Do not persist the result
        #[arg(long)]
        no_save: bool,
    },

    /// List the configured locations of a portal
    Locations {
        #[arg(long)]
        portal: Portal,
    },

    /// Print the latest stored result of a portal
    Latest {
        #[arg(long)]
        portal: Portal,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("No configuration file given, using built-in defaults");
            Config::default()
        }
    };

    let succeeded = match cli.command {
        Command::Scrape {
            portal,
            username,
            password,
            locations,
            no_save,
        } => {
            let mut request = ScrapeRequest::new(portal, Credential::new(username, password));
            if let Some(locations) = locations {
                request = request.with_targets(locations);
            }
            handle_scrape(&config, request, !no_save).await?
        }
        Command::Locations { portal } => handle_locations(&config, portal)?,
        Command::Latest { portal } => handle_latest(&config, portal)?,
    };

    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("terminal_scraper=warn,warn"),
            1 => EnvFilter::new("terminal_scraper=info,warn"),
            2 => EnvFilter::new("terminal_scraper=debug,info"),
            _ => EnvFilter::new("terminal_scraper=trace,debug"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Runs one scrape, printing log events live and the result as JSON
async fn handle_scrape(
    config: &Config,
    request: ScrapeRequest,
    save: bool,
) -> terminal_scraper::Result<bool> {
    let fetcher = Arc::new(Fetcher::from_config(config));
    let adapter = build_adapter(request.portal, config, Arc::clone(&fetcher))?;

    let (tx, mut rx) = mpsc::unbounded_channel::<LogEvent>();
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            print_event(&event);
        }
    });

    let result = Orchestrator::new(adapter.as_ref(), fetcher.limiter().max_concurrent())
        .with_log_stream(tx)
        .run(&request)
        .await;
    if let Err(err) = printer.await {
        tracing::warn!(error = %err, "Log printer task ended abnormally");
    }

    tracing::debug!(
        requests = fetcher.requests_sent(),
        peak_in_flight = fetcher.limiter().peak_in_flight(),
        "Run finished"
    );

    write_json(&result)?;

    if save {
        if let Some(data) = &result.data {
            let path = Path::new(&config.storage.database_path);
            let mut storage = open_storage(path)?;
            let id = storage.save_snapshot(request.portal, data)?;
            eprintln!("✓ Saved snapshot {} to {}", id, path.display());
        }
    }

    Ok(result.success)
}

/// Prints the locations a portal offers without logging in
fn handle_locations(config: &Config, portal: Portal) -> terminal_scraper::Result<bool> {
    let fetcher = Arc::new(Fetcher::from_config(config));
    let adapter = build_adapter(portal, config, fetcher)?;

    let mut out = io::stdout().lock();
    writeln!(out, "{} locations:", adapter.label())?;
    for entry in adapter.known_targets() {
        writeln!(out, "  {:<10} {}", entry.code, entry.name)?;
    }

    Ok(true)
}

/// Prints the latest stored snapshot of a portal
fn handle_latest(config: &Config, portal: Portal) -> terminal_scraper::Result<bool> {
    let storage = open_storage(Path::new(&config.storage.database_path))?;

    match storage.latest_snapshot(portal)? {
        Some(snapshot) => {
            write_json(&snapshot)?;
            Ok(true)
        }
        None => {
            eprintln!("✗ No stored snapshot for {}", portal);
            Ok(false)
        }
    }
}

/// Writes `value` to stdout as pretty JSON
fn write_json<T: Serialize>(value: &T) -> terminal_scraper::Result<()> {
    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

fn print_event(event: &LogEvent) {
    let marker = match event.kind {
        LogKind::Success => "✓",
        LogKind::Error => "✗",
        LogKind::Info => "→",
    };
    eprintln!("{} {}", marker, event.message);
}
