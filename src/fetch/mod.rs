//! Resilient HTTP fetching through the proxy pool
//!
//! This module executes every page request for the crawler:
//! - Bounded proxied attempts, each through a randomly picked endpoint
//! - Quarantine of endpoints that fail a request
//! - A single guaranteed direct attempt once the proxied phase ends
//! - Fixed politeness delay before every attempt
//!
//! A fetch that exhausts every attempt yields `None`; that is an expected
//! outcome for the caller, not an error.

mod agent;
mod policy;

pub use agent::AgentPicker;

use crate::config::FetchConfig;
use crate::proxy::{proxy_url, ProxyPool};
use policy::AttemptPlan;
use reqwest::header::USER_AGENT;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Per-request timeout, covering connect through body download
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: String,
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: String,
}

/// Fetches URLs through the proxy pool with a direct fallback
///
/// One instance is shared between the discovery crawl and the article
/// scrape so both phases draw on the same pool and quarantine state.
pub struct ResilientFetcher {
    pool: Arc<ProxyPool>,
    direct: Client,
    agents: AgentPicker,
    proxy_attempts: u32,
    delay: Duration,
}

impl ResilientFetcher {
    /// Builds a fetcher over the given pool
    ///
    /// # Arguments
    ///
    /// * `pool` - Shared proxy pool; may be empty for direct-only operation
    /// * `config` - Request behavior (attempt budget, delay, user agent)
    pub fn new(pool: Arc<ProxyPool>, config: &FetchConfig) -> crate::Result<Self> {
        let direct = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .danger_accept_invalid_certs(true)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            pool,
            direct,
            agents: AgentPicker::new(config.user_agent.clone()),
            proxy_attempts: config.proxy_attempts_per_url,
            delay: Duration::from_millis(config.request_delay_ms),
        })
    }

    /// Fetches one URL, rotating proxies before falling back to direct
    ///
    /// Up to `proxy-attempts-per-url` proxied attempts run first; each
    /// failure quarantines its endpoint and moves on. When the attempt
    /// budget is spent, or the pool has no usable endpoint, exactly one
    /// direct attempt follows. Every attempt waits the politeness delay
    /// first. `None` means all attempts failed.
    pub async fn fetch(&self, url: &str) -> Option<FetchedPage> {
        let mut plan = AttemptPlan::new(self.proxy_attempts);

        while plan.proxied_phase() {
            let Some(endpoint) = self.pool.pick().await else {
                tracing::debug!("No proxy available for {}, falling back to direct", url);
                break;
            };

            let attempt = plan.begin_proxied();
            self.pause().await;

            match self.proxied_attempt(url, &endpoint).await {
                Ok(page) => {
                    tracing::debug!(
                        "Fetched {} via proxy {} (attempt {}/{})",
                        url,
                        endpoint,
                        attempt,
                        self.proxy_attempts
                    );
                    return Some(page);
                }
                Err(cause) => {
                    tracing::warn!(
                        "Proxy attempt {}/{} for {} via {} failed: {}",
                        attempt,
                        self.proxy_attempts,
                        url,
                        endpoint,
                        cause
                    );
                    self.pool.quarantine(&endpoint);
                }
            }
        }

        if plan.begin_direct() {
            self.pause().await;
            match self.attempt(&self.direct, url).await {
                Ok(page) => {
                    tracing::debug!("Fetched {} directly", url);
                    return Some(page);
                }
                Err(cause) => {
                    tracing::warn!("Direct attempt for {} failed: {}", url, cause);
                }
            }
        }

        tracing::error!(
            "Giving up on {} after {} proxied attempts and the direct fallback",
            url,
            plan.proxied_taken()
        );
        None
    }

    async fn proxied_attempt(
        &self,
        url: &str,
        endpoint: &str,
    ) -> std::result::Result<FetchedPage, String> {
        let proxy = reqwest::Proxy::all(proxy_url(endpoint)).map_err(|e| e.to_string())?;
        let client = Client::builder()
            .proxy(proxy)
            .timeout(FETCH_TIMEOUT)
            .danger_accept_invalid_certs(true)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| e.to_string())?;

        self.attempt(&client, url).await
    }

    async fn attempt(
        &self,
        client: &Client,
        url: &str,
    ) -> std::result::Result<FetchedPage, String> {
        let response = client
            .get(url)
            .header(USER_AGENT, self.agents.choose())
            .send()
            .await
            .map_err(describe_error)?;

        let status = response.status();
        let final_url = response.url().to_string();

        if !status.is_success() {
            return Err(format!("status {}", status.as_u16()));
        }

        let body = response.text().await.map_err(describe_error)?;
        Ok(FetchedPage {
            final_url,
            status: status.as_u16(),
            body,
        })
    }

    async fn pause(&self) {
        tokio::time::sleep(self.delay).await;
    }
}

fn describe_error(err: reqwest::Error) -> String {
    if err.is_timeout() {
        "request timeout".to_string()
    } else if err.is_connect() {
        "connection failed".to_string()
    } else {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> FetchConfig {
        FetchConfig {
            user_agent: Some("TestAgent/1.0".to_string()),
            proxy_attempts_per_url: 2,
            request_delay_ms: 0,
        }
    }

    #[tokio::test]
    async fn test_unreachable_direct_returns_none() {
        // Empty pool with no source: the proxied phase is skipped and the
        // single direct attempt hits a port nothing listens on.
        let pool = Arc::new(ProxyPool::new(None).unwrap());
        let fetcher = ResilientFetcher::new(pool, &create_test_config()).unwrap();

        let result = fetcher.fetch("http://127.0.0.1:1/page").await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_dead_proxies_are_quarantined() {
        let pool = Arc::new(
            ProxyPool::from_endpoints(vec![
                "127.0.0.1:1".to_string(),
                "127.0.0.1:2".to_string(),
            ])
            .unwrap(),
        );
        let fetcher = ResilientFetcher::new(Arc::clone(&pool), &create_test_config()).unwrap();

        // Target is also unreachable, so the whole fetch fails; both
        // proxied attempts must have quarantined their endpoint.
        let result = fetcher.fetch("http://127.0.0.1:3/page").await;
        assert!(result.is_none());
        assert_eq!(pool.quarantined_count(), 2);
        assert_eq!(pool.usable_count(), 0);
    }
}
