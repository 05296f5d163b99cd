//! Budgeted breadth-first article discovery
//!
//! This module contains the discovery engine that walks a site outward
//! from seed pages:
//! - FIFO frontier of (URL, depth) pairs, seeded at depth 0
//! - Rounds of up to `worker-threads` concurrent page crawls
//! - A barrier per round: every task finishes before results are admitted
//! - A global article budget capping both collection and admission
//! - Dedupe against the per-run visited set and the persisted ledger
//!
//! All run state (visited set, frontier, collected articles) lives inside
//! one `discover` call, so concurrent or repeated runs never interfere.

mod links;
mod matcher;
mod visited;

pub use links::{HtmlLinkExtractor, LinkExtractor};
pub use matcher::ArticleMatcher;
pub use visited::VisitedSet;

use crate::config::CrawlConfig;
use crate::fetch::ResilientFetcher;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tokio::task::JoinSet;
use url::Url;

/// Outcome of one discovery run
#[derive(Debug)]
pub struct Discovery {
    /// Article URLs collected, capped at the configured budget
    pub articles: HashSet<String>,
    /// Frontier entries never crawled because the run went terminal first
    pub pending: Vec<(String, u32)>,
}

/// Links reported by one crawled page, already partitioned
#[derive(Debug)]
struct CrawlOutcome {
    depth: u32,
    fresh: Vec<String>,
    seen: Vec<String>,
}

impl CrawlOutcome {
    fn empty(depth: u32) -> Self {
        Self {
            depth,
            fresh: Vec::new(),
            seen: Vec::new(),
        }
    }
}

/// Breadth-first crawler collecting article URLs from one site
///
/// The engine owns no run state; each `discover` call creates and
/// discards its own visited set, frontier, and accumulator.
pub struct DiscoveryEngine {
    fetcher: Arc<ResilientFetcher>,
    extractor: Arc<dyn LinkExtractor>,
    matcher: Arc<ArticleMatcher>,
    processed: Arc<HashSet<String>>,
    max_articles: usize,
    worker_threads: usize,
}

impl DiscoveryEngine {
    /// Creates an engine over the shared fetcher
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Fetcher shared with the scrape phase (same proxy pool)
    /// * `extractor` - Link extraction strategy for crawled pages
    /// * `matcher` - Article predicate for the target site
    /// * `processed` - URLs already in the ledger; never re-collected
    /// * `crawl` - Budget and concurrency settings
    pub fn new(
        fetcher: Arc<ResilientFetcher>,
        extractor: Arc<dyn LinkExtractor>,
        matcher: ArticleMatcher,
        processed: Arc<HashSet<String>>,
        crawl: &CrawlConfig,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            matcher: Arc::new(matcher),
            processed,
            max_articles: crawl.max_articles,
            worker_threads: crawl.worker_threads.max(1),
        }
    }

    /// Runs one discovery crawl from the given seeds
    ///
    /// Seeds enter the frontier at depth 0. The run is terminal when the
    /// frontier empties or the article budget is reached; the returned
    /// `Discovery` carries the collected set plus whatever the frontier
    /// still held at termination.
    pub async fn discover(&self, seeds: &[String]) -> Discovery {
        let visited = Arc::new(VisitedSet::new(self.max_articles));
        let mut frontier: VecDeque<(String, u32)> =
            seeds.iter().map(|seed| (seed.clone(), 0)).collect();
        let mut articles: HashSet<String> = HashSet::new();
        let mut round = 0u32;

        while !frontier.is_empty() && articles.len() < self.max_articles {
            round += 1;
            let mut batch = Vec::with_capacity(self.worker_threads);
            while batch.len() < self.worker_threads {
                let Some(entry) = frontier.pop_front() else { break };
                batch.push(entry);
            }

            tracing::debug!(
                "Round {}: crawling {} pages ({}/{} articles collected)",
                round,
                batch.len(),
                articles.len(),
                self.max_articles
            );

            let mut tasks = JoinSet::new();
            for (url, depth) in batch {
                let worker = self.worker(Arc::clone(&visited));
                tasks.spawn(async move { worker.crawl_one(url, depth).await });
            }

            // Batch barrier: all tasks resolve before any admission below.
            let mut outcomes = Vec::new();
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(outcome) => outcomes.push(outcome),
                    Err(err) => tracing::error!("Crawl task failed: {}", err),
                }
            }

            for outcome in outcomes {
                let next_depth = outcome.depth + 1;

                for link in outcome.fresh {
                    if articles.len() >= self.max_articles {
                        break;
                    }
                    // Two pages in one round can report the same link fresh;
                    // it is admitted and enqueued once.
                    if articles.insert(link.clone()) {
                        frontier.push_back((link, next_depth));
                    }
                }

                // Seen links still get traversed for their outbound links,
                // as long as the goal is unmet and a worker has not already
                // crawled them this run.
                if articles.len() < self.max_articles {
                    for link in outcome.seen {
                        if !visited.contains(&link) {
                            frontier.push_back((link, next_depth));
                        }
                    }
                }
            }
        }

        tracing::info!(
            "Discovery finished after {} rounds: {} articles collected, {} frontier entries left",
            round,
            articles.len(),
            frontier.len()
        );

        Discovery {
            articles,
            pending: frontier.into_iter().collect(),
        }
    }

    fn worker(&self, visited: Arc<VisitedSet>) -> CrawlWorker {
        CrawlWorker {
            fetcher: Arc::clone(&self.fetcher),
            extractor: Arc::clone(&self.extractor),
            matcher: Arc::clone(&self.matcher),
            processed: Arc::clone(&self.processed),
            visited,
        }
    }
}

/// One round-task's view of the engine
struct CrawlWorker {
    fetcher: Arc<ResilientFetcher>,
    extractor: Arc<dyn LinkExtractor>,
    matcher: Arc<ArticleMatcher>,
    processed: Arc<HashSet<String>>,
    visited: Arc<VisitedSet>,
}

impl CrawlWorker {
    /// Crawls one page and partitions its article links
    ///
    /// Returns empty when the URL loses the admission race, the budget is
    /// already spent, or the fetch fails; a failed page never stops the
    /// round.
    async fn crawl_one(self, url: String, depth: u32) -> CrawlOutcome {
        if !self.visited.try_admit(&url) {
            tracing::debug!("Skipping {} (already visited or budget reached)", url);
            return CrawlOutcome::empty(depth);
        }

        tracing::info!("Crawling {} (depth {})", url, depth);

        let Some(page) = self.fetcher.fetch(&url).await else {
            tracing::warn!("No response for {}, dropping it from this run", url);
            return CrawlOutcome::empty(depth);
        };

        // Resolve against the post-redirect URL when it parses, else the
        // requested one.
        let base = match Url::parse(&page.final_url).or_else(|_| Url::parse(&url)) {
            Ok(base) => base,
            Err(_) => return CrawlOutcome::empty(depth),
        };

        let mut in_page = HashSet::new();
        let mut candidates = Vec::new();
        for link in self.extractor.extract(&page.body, &base) {
            if self.matcher.is_article(&link) && in_page.insert(link.clone()) {
                candidates.push(link);
            }
        }

        let (fresh, seen) = self.visited.partition(candidates, &self.processed);
        tracing::debug!(
            "Page {} yielded {} fresh and {} seen article links",
            url,
            fresh.len(),
            seen.len()
        );

        CrawlOutcome { depth, fresh, seen }
    }
}
