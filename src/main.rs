//! Gleaner main entry point
//!
//! This is the command-line interface for the Gleaner article harvester.

use anyhow::Context;
use clap::Parser;
use gleaner::config::load_config_with_hash;
use gleaner::harvest::run_harvest;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Gleaner: a single-site article harvester
///
/// Gleaner follows links outward from seed pages to find article pages on
/// one news site, fetches them through a rotating proxy pool with a direct
/// fallback, and saves the extracted articles into a SQLite ledger.
#[derive(Parser, Debug)]
#[command(name = "gleaner")]
#[command(version = "0.4.0")]
#[command(about = "A single-site article harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show the harvest plan without touching the network
    #[arg(long, conflicts_with_all = ["stats", "check_proxies"])]
    dry_run: bool,

    /// Show ledger statistics and recent runs, then exit
    #[arg(long, conflicts_with_all = ["dry_run", "check_proxies"])]
    stats: bool,

    /// Refresh the proxy pool and probe every endpoint, then exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    check_proxies: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load and validate configuration
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;

    // Setup logging based on verbosity and the configured log file
    setup_logging(cli.verbose, cli.quiet, config.output.log_path.as_deref())?;

    tracing::info!(
        "Configuration loaded from {} (hash {})",
        cli.config.display(),
        config_hash
    );

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config, &config_hash);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.check_proxies {
        handle_check_proxies(&config).await?;
    } else {
        handle_harvest(config, &config_hash).await?;
    }

    Ok(())
}

/// Sets up the tracing subscriber based on verbosity level
///
/// When a log file is configured, output goes both to stderr and to the
/// file (with ANSI colors disabled).
fn setup_logging(verbose: u8, quiet: bool, log_path: Option<&str>) -> anyhow::Result<()> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("gleaner=info,warn"),
            1 => EnvFilter::new("gleaner=debug,info"),
            2 => EnvFilter::new("gleaner=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let console = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let registry = tracing_subscriber::registry().with(filter).with(console);

    match log_path {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("could not create log file {}", path))?;
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(Arc::new(file))
                .with_ansi(false)
                .with_target(false);
            registry.with(file_layer).init();
        }
        None => registry.init(),
    }

    Ok(())
}

/// Handles the --dry-run mode: validates config and shows the harvest plan
fn handle_dry_run(config: &gleaner::config::Config, config_hash: &str) {
    println!("=== Gleaner Dry Run ===\n");

    println!("Site:");
    println!("  Base domain: {}", config.site.base_domain);
    println!("  Article pattern: {}", config.site.article_pattern);
    println!("  Seeds ({}):", config.site.seed_urls.len());
    for seed in &config.site.seed_urls {
        println!("    * {}", seed);
    }

    println!("\nCrawl:");
    println!("  Max articles: {}", config.crawl.max_articles);
    println!("  Worker threads: {}", config.crawl.worker_threads);

    println!("\nFetch:");
    match &config.fetch.user_agent {
        Some(agent) => println!("  User agent: {}", agent),
        None => println!("  User agent: rotated per request"),
    }
    println!(
        "  Proxy attempts per URL: {}",
        config.fetch.proxy_attempts_per_url
    );
    println!("  Request delay: {}ms", config.fetch.request_delay_ms);

    println!("\nProxy:");
    match &config.proxy.source_url {
        Some(source) => println!("  Source: {}", source),
        None => println!("  Source: none (all requests go direct)"),
    }

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    match &config.output.log_path {
        Some(path) => println!("  Log file: {}", path),
        None => println!("  Log file: none (stderr only)"),
    }

    println!("\n✓ Configuration is valid (hash {})", config_hash);
    println!(
        "✓ Would harvest up to {} articles from {} seed URLs",
        config.crawl.max_articles,
        config.site.seed_urls.len()
    );
}

/// Handles the --stats mode: shows ledger totals and recent runs
fn handle_stats(config: &gleaner::config::Config) -> anyhow::Result<()> {
    use gleaner::storage::{open_store, ArticleStore};
    use std::path::Path;

    println!("Database: {}\n", config.output.database_path);

    let store = open_store(Path::new(&config.output.database_path))
        .context("failed to open the ledger database")?;

    let articles = store.count_articles()?;
    let words = store.total_word_count()?;
    println!("Articles saved: {}", articles);
    println!("Total words:    {}", words);

    let runs = store.recent_runs(10)?;
    if runs.is_empty() {
        println!("\nNo runs recorded yet");
    } else {
        println!("\nRecent runs:");
        for run in runs {
            let finished = run.finished_at.as_deref().unwrap_or("-");
            println!(
                "  #{} started={} status={} seeds={} discovered={} saved={} finished={}",
                run.id,
                run.started_at,
                run.status.to_db_string(),
                run.seeds,
                run.discovered,
                run.saved,
                finished
            );
        }
    }

    Ok(())
}

/// Handles the --check-proxies mode: refreshes the pool and probes endpoints
async fn handle_check_proxies(config: &gleaner::config::Config) -> anyhow::Result<()> {
    use gleaner::proxy::{check_proxies, ProxyPool};

    let Some(source) = &config.proxy.source_url else {
        println!("No proxy source configured, nothing to check");
        return Ok(());
    };

    println!("Refreshing proxy list from {}", source);
    let pool = ProxyPool::new(Some(source.clone()))?;
    if !pool.refresh().await {
        anyhow::bail!("could not download the proxy list from {}", source);
    }
    println!("Probing {} endpoints...\n", pool.endpoint_count());

    // Probe against the site we intend to harvest
    let probe_url = &config.site.seed_urls[0];
    let report = check_proxies(&pool, probe_url, config.crawl.worker_threads).await;

    println!("Working ({}):", report.working.len());
    for endpoint in &report.working {
        println!("  + {}", endpoint);
    }
    println!("\nFailed ({}):", report.failed.len());
    for endpoint in &report.failed {
        println!("  - {}", endpoint);
    }
    println!(
        "\n{} of {} endpoints usable",
        report.working.len(),
        report.total()
    );

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(config: gleaner::config::Config, config_hash: &str) -> anyhow::Result<()> {
    tracing::info!(
        "Harvesting {} (budget {}, {} workers)",
        config.site.base_domain,
        config.crawl.max_articles,
        config.crawl.worker_threads
    );

    let report = run_harvest(config, config_hash)
        .await
        .context("harvest failed")?;

    println!("\n=== Harvest Summary ===");
    println!("Run:        #{}", report.run_id);
    println!("Discovered: {}", report.discovered);
    println!("Saved:      {}", report.saved);
    println!("Skipped:    {}", report.skipped);
    println!("Failed:     {}", report.failed);
    println!("Unexplored: {}", report.pending);
    println!("Elapsed:    {:.1?}", report.elapsed);

    Ok(())
}
