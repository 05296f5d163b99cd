//! Harvest orchestration
//!
//! This module ties the other pieces together into one run:
//! - Opening the ledger and loading the already-processed URL set
//! - Building the shared proxy pool and fetcher
//! - One budgeted discovery crawl per seed, unioned and deduplicated
//! - A bounded fan-out that scrapes, extracts, and saves each article
//! - Run bookkeeping in the ledger

use crate::config::Config;
use crate::discover::{ArticleMatcher, DiscoveryEngine, HtmlLinkExtractor};
use crate::extract::{ContentExtractor, SelectorExtractor};
use crate::fetch::ResilientFetcher;
use crate::proxy::ProxyPool;
use crate::storage::{self, ArticleStore, RunStatus, SqliteStore};
use std::collections::{HashSet, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

/// Final counts for one harvest run
#[derive(Debug, Clone)]
pub struct HarvestReport {
    pub run_id: i64,
    /// Unique article URLs found across all seeds
    pub discovered: usize,
    /// Frontier entries left unexplored when discovery went terminal
    pub pending: usize,
    /// Articles written to the ledger
    pub saved: usize,
    /// Articles skipped (already in the ledger, or no usable content)
    pub skipped: usize,
    /// Articles whose fetch or save failed
    pub failed: usize,
    pub elapsed: Duration,
}

/// Counters accumulated while a run executes
#[derive(Debug, Default)]
struct RunCounts {
    discovered: usize,
    pending: usize,
    saved: usize,
    skipped: usize,
    failed: usize,
}

/// What happened to one scraped article URL
enum ScrapeOutcome {
    Saved,
    Skipped,
    Failed,
}

/// Runs one full harvest
///
/// This function orchestrates the entire process:
///
/// 1. Open the ledger and load the already-processed URL set
/// 2. Create a run row
/// 3. Build the proxy pool (refreshed once up front) and the fetcher
/// 4. Run one discovery crawl per seed and union the results
/// 5. Scrape the union with bounded concurrency, saving each article
/// 6. Complete the run row with final counts
///
/// # Arguments
///
/// * `config` - The validated harvester configuration
/// * `config_hash` - Hash of the raw config text, recorded with the run
///
/// # Returns
///
/// * `Ok(HarvestReport)` - Run finished; counts describe what happened
/// * `Err(HarvestError)` - Setup or bookkeeping failed
///
/// # Example
///
/// ```no_run
/// use gleaner::config::load_config_with_hash;
/// use gleaner::harvest::run_harvest;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (config, hash) = load_config_with_hash(Path::new("config.toml"))?;
/// let report = run_harvest(config, &hash).await?;
/// println!("saved {} of {} articles", report.saved, report.discovered);
/// # Ok(())
/// # }
/// ```
pub async fn run_harvest(config: Config, config_hash: &str) -> crate::Result<HarvestReport> {
    let start = Instant::now();

    let mut store = storage::open_store(Path::new(&config.output.database_path))?;
    let processed = Arc::new(store.processed_urls()?);
    let run_id = store.create_run(config_hash, config.site.seed_urls.len() as u32)?;
    let store = Arc::new(Mutex::new(store));

    tracing::info!(
        "Run {} started: {} seeds, {} URLs already in the ledger",
        run_id,
        config.site.seed_urls.len(),
        processed.len()
    );

    match execute(&config, Arc::clone(&store), processed).await {
        Ok(counts) => {
            {
                let mut store = store.lock().unwrap();
                store.complete_run(
                    run_id,
                    counts.discovered as u64,
                    counts.saved as u64,
                    RunStatus::Completed,
                )?;
            }

            let report = HarvestReport {
                run_id,
                discovered: counts.discovered,
                pending: counts.pending,
                saved: counts.saved,
                skipped: counts.skipped,
                failed: counts.failed,
                elapsed: start.elapsed(),
            };
            tracing::info!(
                "Run {} complete: {} discovered, {} saved, {} skipped, {} failed in {:?}",
                run_id,
                report.discovered,
                report.saved,
                report.skipped,
                report.failed,
                report.elapsed
            );
            Ok(report)
        }
        Err(err) => {
            let mut store = store.lock().unwrap();
            if let Err(db_err) = store.complete_run(run_id, 0, 0, RunStatus::Failed) {
                tracing::error!("Failed to record run {} failure: {}", run_id, db_err);
            }
            Err(err)
        }
    }
}

/// Discovery and scrape phases, sharing one pool and fetcher
async fn execute(
    config: &Config,
    store: Arc<Mutex<SqliteStore>>,
    processed: Arc<HashSet<String>>,
) -> crate::Result<RunCounts> {
    let pool = Arc::new(ProxyPool::new(config.proxy.source_url.clone())?);
    if config.proxy.source_url.is_some() {
        pool.refresh().await;
    }

    let fetcher = Arc::new(ResilientFetcher::new(Arc::clone(&pool), &config.fetch)?);
    let matcher = ArticleMatcher::new(&config.site.base_domain, &config.site.article_pattern)?;
    let extractor: Arc<dyn ContentExtractor> = Arc::new(SelectorExtractor::new(&config.extract)?);

    let engine = DiscoveryEngine::new(
        Arc::clone(&fetcher),
        Arc::new(HtmlLinkExtractor::default()),
        matcher,
        Arc::clone(&processed),
        &config.crawl,
    );

    let mut counts = RunCounts::default();

    // Phase 1: one budgeted discovery crawl per seed
    let mut union: HashSet<String> = HashSet::new();
    for seed in &config.site.seed_urls {
        tracing::info!("Discovering from seed {}", seed);
        let discovery = engine.discover(std::slice::from_ref(seed)).await;
        tracing::info!(
            "Seed {} yielded {} articles ({} frontier entries unexplored)",
            seed,
            discovery.articles.len(),
            discovery.pending.len()
        );
        counts.pending += discovery.pending.len();
        union.extend(discovery.articles);
    }

    counts.discovered = union.len();
    tracing::info!(
        "Discovery found {} unique articles across {} seeds",
        counts.discovered,
        config.site.seed_urls.len()
    );

    // Phase 2: scrape the union with bounded concurrency
    let mut queue: VecDeque<String> = union.into_iter().collect();
    let limit = config.crawl.worker_threads.max(1);
    let mut tasks = JoinSet::new();

    loop {
        while tasks.len() < limit {
            let Some(url) = queue.pop_front() else { break };
            let fetcher = Arc::clone(&fetcher);
            let extractor = Arc::clone(&extractor);
            let store = Arc::clone(&store);
            tasks.spawn(async move { scrape_one(fetcher, extractor, store, url).await });
        }

        let Some(joined) = tasks.join_next().await else {
            break;
        };
        match joined {
            Ok(ScrapeOutcome::Saved) => counts.saved += 1,
            Ok(ScrapeOutcome::Skipped) => counts.skipped += 1,
            Ok(ScrapeOutcome::Failed) => counts.failed += 1,
            Err(err) => {
                tracing::error!("Scrape task panicked: {}", err);
                counts.failed += 1;
            }
        }
    }

    Ok(counts)
}

/// Fetches one article URL, extracts it, and saves it to the ledger
async fn scrape_one(
    fetcher: Arc<ResilientFetcher>,
    extractor: Arc<dyn ContentExtractor>,
    store: Arc<Mutex<SqliteStore>>,
    url: String,
) -> ScrapeOutcome {
    let Some(page) = fetcher.fetch(&url).await else {
        tracing::warn!("Failed to fetch article {}", url);
        return ScrapeOutcome::Failed;
    };

    // The discovered URL is the ledger key, not the post-redirect one.
    let Some(article) = extractor.extract(&page.body, &url) else {
        tracing::warn!("No usable content at {}, skipping", url);
        return ScrapeOutcome::Skipped;
    };

    let result = {
        let mut store = store.lock().unwrap();
        store.save_article(&article)
    };

    match result {
        Ok(true) => {
            tracing::info!("Saved {} ({} words)", article.url, article.word_count);
            ScrapeOutcome::Saved
        }
        Ok(false) => {
            tracing::info!("Already in the ledger, skipped {}", article.url);
            ScrapeOutcome::Skipped
        }
        Err(err) => {
            tracing::error!("Failed to save {}: {}", article.url, err);
            ScrapeOutcome::Failed
        }
    }
}
