//! Rotating proxy pool with quarantine
//!
//! This module maintains the shared pool of proxy endpoints the fetcher
//! rotates through:
//! - Refresh from a configured source serving a newline-delimited list
//! - Uniform random pick over endpoints not currently quarantined
//! - Idempotent quarantine of endpoints that failed a request
//! - Concurrent health probing for the CLI check mode
//!
//! Quarantine state is scoped to a pool generation: a successful refresh
//! replaces the endpoint list and clears the quarantine set.

mod probe;

pub use probe::{check_proxies, ProbeReport};

use crate::Result;
use reqwest::Client;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

/// Timeout for downloading the proxy list itself
const SOURCE_TIMEOUT: Duration = Duration::from_secs(10);

/// Snapshot of pool contents behind the lock
#[derive(Debug, Default)]
struct PoolState {
    endpoints: Vec<String>,
    quarantined: HashSet<String>,
    generation: u64,
}

/// Shared pool of proxy endpoints with a quarantine set
///
/// All mutation goes through methods that acquire the internal lock, so the
/// pool can be shared freely between concurrent fetch attempts. The lock is
/// never held across network I/O.
pub struct ProxyPool {
    client: Client,
    source_url: Option<String>,
    inner: Mutex<PoolState>,
}

impl ProxyPool {
    /// Creates an empty pool that refreshes from the given source URL
    ///
    /// With no source URL the pool stays empty and every `pick` returns
    /// `None`, which callers treat as "use a direct connection".
    pub fn new(source_url: Option<String>) -> Result<Self> {
        let client = Client::builder().timeout(SOURCE_TIMEOUT).build()?;
        Ok(Self {
            client,
            source_url,
            inner: Mutex::new(PoolState::default()),
        })
    }

    /// Creates a pool pre-seeded with endpoints and no refresh source
    pub fn from_endpoints(endpoints: Vec<String>) -> Result<Self> {
        let pool = Self::new(None)?;
        {
            let mut state = pool.inner.lock().unwrap();
            state.endpoints = endpoints;
        }
        Ok(pool)
    }

    /// Downloads a fresh endpoint list from the configured source
    ///
    /// On success the endpoint list is replaced, the quarantine set is
    /// cleared, and the pool generation advances. On failure the previous
    /// list (possibly empty) stays in place and the quarantine set is kept.
    /// Returns whether a new list was installed.
    pub async fn refresh(&self) -> bool {
        let Some(source) = &self.source_url else {
            tracing::debug!("No proxy source configured, skipping refresh");
            return false;
        };

        let body = match self.download_list(source).await {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!("Proxy list refresh from {} failed: {}", source, err);
                return false;
            }
        };

        let endpoints: Vec<String> = body
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        let mut state = self.inner.lock().unwrap();
        state.endpoints = endpoints;
        state.quarantined.clear();
        state.generation += 1;
        tracing::info!(
            "Refreshed proxy pool: {} endpoints (generation {})",
            state.endpoints.len(),
            state.generation
        );
        true
    }

    async fn download_list(&self, source: &str) -> std::result::Result<String, reqwest::Error> {
        let response = self.client.get(source).send().await?.error_for_status()?;
        response.text().await
    }

    /// Picks one endpoint uniformly at random from the usable set
    ///
    /// If every endpoint is quarantined (or the list is empty), one refresh
    /// is attempted and the selection retried. `None` means no proxy is
    /// available; that is a valid steady state, not an error.
    pub async fn pick(&self) -> Option<String> {
        if let Some(endpoint) = self.pick_usable() {
            return Some(endpoint);
        }

        self.refresh().await;
        self.pick_usable()
    }

    fn pick_usable(&self) -> Option<String> {
        let state = self.inner.lock().unwrap();
        let usable: Vec<&String> = state
            .endpoints
            .iter()
            .filter(|endpoint| !state.quarantined.contains(*endpoint))
            .collect();

        if usable.is_empty() {
            return None;
        }

        Some(usable[fastrand::usize(..usable.len())].clone())
    }

    /// Quarantines an endpoint for the rest of the current generation
    ///
    /// Idempotent. Endpoints not in the current list (e.g. picked just
    /// before a refresh replaced it) are ignored, so the quarantine set
    /// only ever references known endpoints.
    pub fn quarantine(&self, endpoint: &str) {
        let mut state = self.inner.lock().unwrap();
        if !state.endpoints.iter().any(|known| known == endpoint) {
            tracing::debug!("Ignoring quarantine for unknown proxy {}", endpoint);
            return;
        }

        if state.quarantined.insert(endpoint.to_string()) {
            let usable = state.endpoints.len() - state.quarantined.len();
            tracing::warn!(
                "Quarantined proxy {} ({} of {} endpoints remain usable)",
                endpoint,
                usable,
                state.endpoints.len()
            );
        }
    }

    /// Number of endpoints in the current list
    pub fn endpoint_count(&self) -> usize {
        self.inner.lock().unwrap().endpoints.len()
    }

    /// Number of endpoints currently usable (not quarantined)
    pub fn usable_count(&self) -> usize {
        let state = self.inner.lock().unwrap();
        state.endpoints.len() - state.quarantined.len()
    }

    /// Number of endpoints currently quarantined
    pub fn quarantined_count(&self) -> usize {
        self.inner.lock().unwrap().quarantined.len()
    }

    /// Current pool generation; advances on every successful refresh
    pub fn generation(&self) -> u64 {
        self.inner.lock().unwrap().generation
    }

    /// Snapshot of the current endpoint list
    pub fn endpoints(&self) -> Vec<String> {
        self.inner.lock().unwrap().endpoints.clone()
    }
}

/// Expands a `host:port` endpoint into a proxy URL
///
/// Endpoints that already carry a scheme are passed through unchanged.
pub fn proxy_url(endpoint: &str) -> String {
    if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("http://{}", endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_pool(endpoints: &[&str]) -> ProxyPool {
        ProxyPool::from_endpoints(endpoints.iter().map(|e| e.to_string()).collect()).unwrap()
    }

    #[tokio::test]
    async fn test_pick_returns_seeded_endpoint() {
        let pool = seeded_pool(&["10.0.0.1:8080"]);
        assert_eq!(pool.pick().await.as_deref(), Some("10.0.0.1:8080"));
    }

    #[tokio::test]
    async fn test_pick_never_returns_quarantined() {
        let pool = seeded_pool(&["10.0.0.1:8080", "10.0.0.2:8080"]);
        pool.quarantine("10.0.0.1:8080");

        for _ in 0..50 {
            assert_eq!(pool.pick().await.as_deref(), Some("10.0.0.2:8080"));
        }
    }

    #[tokio::test]
    async fn test_pick_exhausted_pool_returns_none() {
        // No source URL, so the refresh inside pick is a no-op.
        let pool = seeded_pool(&["10.0.0.1:8080"]);
        pool.quarantine("10.0.0.1:8080");
        assert_eq!(pool.pick().await, None);
    }

    #[tokio::test]
    async fn test_empty_pool_returns_none() {
        let pool = ProxyPool::new(None).unwrap();
        assert_eq!(pool.pick().await, None);
    }

    #[test]
    fn test_quarantine_is_idempotent() {
        let pool = seeded_pool(&["10.0.0.1:8080", "10.0.0.2:8080"]);
        pool.quarantine("10.0.0.1:8080");
        pool.quarantine("10.0.0.1:8080");
        assert_eq!(pool.quarantined_count(), 1);
        assert_eq!(pool.usable_count(), 1);
    }

    #[test]
    fn test_quarantine_unknown_endpoint_ignored() {
        let pool = seeded_pool(&["10.0.0.1:8080"]);
        pool.quarantine("172.16.0.9:3128");
        assert_eq!(pool.quarantined_count(), 0);
    }

    #[test]
    fn test_counts() {
        let pool = seeded_pool(&["a:1", "b:2", "c:3"]);
        assert_eq!(pool.endpoint_count(), 3);
        assert_eq!(pool.usable_count(), 3);

        pool.quarantine("b:2");
        assert_eq!(pool.endpoint_count(), 3);
        assert_eq!(pool.usable_count(), 2);
        assert_eq!(pool.quarantined_count(), 1);
    }

    #[test]
    fn test_proxy_url_adds_scheme() {
        assert_eq!(proxy_url("10.0.0.1:8080"), "http://10.0.0.1:8080");
        assert_eq!(proxy_url("http://10.0.0.1:8080"), "http://10.0.0.1:8080");
        assert_eq!(
            proxy_url("socks5://10.0.0.1:1080"),
            "socks5://10.0.0.1:1080"
        );
    }

    #[test]
    fn test_generation_starts_at_zero() {
        let pool = seeded_pool(&["a:1"]);
        assert_eq!(pool.generation(), 0);
    }
}
