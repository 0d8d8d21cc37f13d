//! Rufus-RAG main entry point
//!
//! This is the command-line interface for the crawl-extract-filter pipeline.

use anyhow::Context;
use clap::Parser;
use rufus_rag::config::{load_config_with_hash, validate, Config};
use rufus_rag::crawler::HttpFetcher;
use rufus_rag::relevance::OpenAiEmbedder;
use rufus_rag::{Pipeline, PipelineResult};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Rufus-RAG: crawl a website and keep what matters
///
/// Rufus-RAG crawls a site to a bounded depth while respecting robots.txt and
/// per-domain rate limits, extracts cleaned text and metadata from every page,
/// and keeps the content whose embedding is similar to the query.
#[derive(Parser, Debug)]
#[command(name = "rufus-rag")]
#[command(version)]
#[command(about = "Crawl a website into retrieval-ready documents", long_about = None)]
struct Cli {
    /// Seed URL to start crawling from
    #[arg(value_name = "URL")]
    url: String,

    /// Text the extracted content should be relevant to
    #[arg(long, value_name = "TEXT")]
    query: String,

    /// Path to TOML configuration file (defaults are used if omitted)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Where to write results (default: <output.dir>/scrape_results_<timestamp>.json)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Write retrieval-ready documents instead of the raw result
    #[arg(long)]
    rag_format: bool,

    /// Cancel the run after this many seconds and keep partial results
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Remove expired cache entries before running
    #[arg(long)]
    clear_expired: bool,

    /// Validate config and show what would run without fetching anything
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load(cli.config.as_deref())?;
    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&config));

    if cli.dry_run {
        return handle_dry_run(&cli, &config, &output_path);
    }

    handle_run(&cli, config, &output_path).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("rufus_rag=info,warn"),
            1 => EnvFilter::new("rufus_rag=debug,info"),
            2 => EnvFilter::new("rufus_rag=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn load(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        tracing::info!("No configuration file given, using defaults");
        return Ok(Config::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok(config)
}

fn default_output_path(config: &Config) -> PathBuf {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    Path::new(&config.output.dir).join(format!("scrape_results_{}.json", timestamp))
}

/// Handles the --dry-run mode: validates config and shows what would run
fn handle_dry_run(cli: &Cli, config: &Config, output_path: &Path) -> anyhow::Result<()> {
    validate(config).context("invalid configuration")?;

    println!("=== Rufus-RAG Dry Run ===\n");
    println!("Seed URL: {}", cli.url);
    println!("Query: {}", cli.query);
    println!("Output: {}", output_path.display());
    println!(
        "Format: {}",
        if cli.rag_format { "RAG documents" } else { "raw results" }
    );
    if let Some(secs) = cli.timeout {
        println!("Timeout: {}s", secs);
    }

    println!("\nEffective configuration:\n");
    println!("{}", toml::to_string_pretty(config)?);

    println!("✓ Configuration is valid");
    Ok(())
}

/// Handles the main pipeline run
async fn handle_run(cli: &Cli, config: Config, output_path: &Path) -> anyhow::Result<()> {
    let fetcher = Arc::new(HttpFetcher::new(&config).context("failed to build HTTP client")?);
    let embedder = Arc::new(OpenAiEmbedder::from_config(&config)?);
    let pipeline = Pipeline::new(config, fetcher, embedder)?;

    if cli.clear_expired {
        let removed = pipeline.cache().clear_expired();
        tracing::info!("Removed {} expired cache entries", removed);
    }

    let cancel = CancellationToken::new();
    spawn_cancellation(cancel.clone(), cli.timeout);

    tracing::info!("Starting scrape of {}", cli.url);
    let result = pipeline.run(&cli.url, &cli.query, &cancel).await?;

    if cli.rag_format {
        write_output(output_path, &result.to_rag_output())?;
    } else {
        write_output(output_path, &result)?;
    }

    print_summary(&result, output_path);
    Ok(())
}

/// Cancels on Ctrl-C, and after `timeout_secs` if given
fn spawn_cancellation(cancel: CancellationToken, timeout_secs: Option<u64>) {
    if let Some(secs) = timeout_secs {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            tracing::warn!("Timeout of {}s reached, cancelling", secs);
            cancel.cancel();
        });
    }

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling");
            cancel.cancel();
        }
    });
}

fn write_output<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!("Results saved to {}", path.display());
    Ok(())
}

fn print_summary(result: &PipelineResult, output_path: &Path) {
    let succeeded = result.successful_pages().count();

    println!("\n=== Scrape Summary ===");
    println!("Pages processed: {}", result.pages.len());
    println!("  Succeeded: {}", succeeded);
    println!("  Failed: {}", result.pages.len() - succeeded);
    println!("Relevant items: {}", result.relevant.len());
    if let Some(error) = &result.relevance_error {
        println!("⚠ Relevance filtering failed: {}", error);
    }
    if result.cancelled {
        println!("⚠ Run was cancelled; results are partial");
    }
    println!("Output: {}", output_path.display());
}
