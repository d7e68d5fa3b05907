//! Folio main entry point
//!
//! This is the command-line interface for the Folio catalog crawler.

use clap::Parser;
use folio_crawler::config::{load_config_with_hash, validate, validate_start_url, Config};
use folio_crawler::crawler::crawl;
use folio_crawler::output::{load_statistics, print_statistics, write_report};
use folio_crawler::FolioError;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Folio: a polite catalog crawler
///
/// Folio walks the paginated listings of a book catalog, visits every
/// linked detail page once, and writes the extracted records as JSON.
#[derive(Parser, Debug)]
#[command(name = "folio-crawler")]
#[command(version = "1.0.0")]
#[command(about = "A polite catalog crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Override the start listing URL
    #[arg(long, value_name = "URL")]
    start_url: Option<String>,

    /// Override the path of the JSON record file
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Override the number of concurrent workers
    #[arg(short, long, value_name = "N")]
    workers: Option<u32>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match load(&cli) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("folio_crawler=info,warn"),
            1 => EnvFilter::new("folio_crawler=debug,info"),
            2 => EnvFilter::new("folio_crawler=trace,debug"),
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

/// Loads the config file (if any) and applies command-line overrides
fn load(cli: &Cli) -> Result<Config, FolioError> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (cfg, hash) = load_config_with_hash(path)?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    if let Some(start_url) = &cli.start_url {
        validate_start_url(start_url)?;
        config.start.url = start_url.clone();
    }
    if let Some(output) = &cli.output {
        config.output.records_path = output.display().to_string();
    }
    if let Some(workers) = cli.workers {
        config.crawler.worker_pool_size = workers;
    }

    // Overrides go through the same checks as file values
    validate(&config)?;
    Ok(config)
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Folio Dry Run ===\n");

    println!("Start listing: {}", config.start.url);

    println!("\nCrawler Configuration:");
    println!("  Workers: {}", config.crawler.worker_pool_size);
    println!("  Max retries: {}", config.crawler.max_retries);
    println!("  Fetch timeout: {}ms", config.crawler.fetch_timeout);
    println!("  Politeness delay: {}ms", config.crawler.politeness_delay);
    println!("  Retry backoff: {}ms", config.crawler.retry_backoff);

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Records: {}", config.output.records_path);
    match &config.output.failures_path {
        Some(path) => println!("  Failures: {}", path),
        None => println!("  Failures: (not written)"),
    }

    println!("\nSelectors:");
    for (field, selector) in config.selectors.fields() {
        println!("  {}: {}", field, selector);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight pages");
            ctrl_c.cancel();
        }
    });

    let report = match crawl(&config, cancel).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    write_report(&report, &config.output)?;
    print_statistics(&load_statistics(&report));

    Ok(())
}
