//! Concurrent proxy health probing
//!
//! Backs the `--check-proxies` CLI mode: every endpoint in the pool gets
//! one GET through itself against a probe URL. Probing only reports; it
//! never quarantines.

use crate::proxy::{proxy_url, ProxyPool};
use reqwest::Client;
use std::time::Duration;
use tokio::task::JoinSet;

/// Per-endpoint probe timeout; probes are cheap and a slow proxy is a
/// failed proxy for our purposes
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of probing every endpoint in the pool
#[derive(Debug, Default)]
pub struct ProbeReport {
    pub working: Vec<String>,
    pub failed: Vec<String>,
}

impl ProbeReport {
    /// Total number of endpoints probed
    pub fn total(&self) -> usize {
        self.working.len() + self.failed.len()
    }
}

/// Probes every pool endpoint concurrently against `probe_url`
///
/// At most `concurrency` probes run at once. An endpoint counts as working
/// when the GET through it completes with a success status inside the
/// probe timeout.
pub async fn check_proxies(pool: &ProxyPool, probe_url: &str, concurrency: usize) -> ProbeReport {
    let endpoints = pool.endpoints();
    tracing::info!("Probing {} proxies against {}", endpoints.len(), probe_url);

    let concurrency = concurrency.max(1);
    let mut pending = endpoints.into_iter();
    let mut tasks = JoinSet::new();
    let mut report = ProbeReport::default();

    loop {
        while tasks.len() < concurrency {
            let Some(endpoint) = pending.next() else { break };
            let probe_url = probe_url.to_string();
            tasks.spawn(async move {
                let ok = probe_endpoint(&endpoint, &probe_url).await;
                (endpoint, ok)
            });
        }

        let Some(joined) = tasks.join_next().await else { break };
        match joined {
            Ok((endpoint, true)) => {
                tracing::debug!("Proxy {} responded", endpoint);
                report.working.push(endpoint);
            }
            Ok((endpoint, false)) => {
                tracing::debug!("Proxy {} failed probe", endpoint);
                report.failed.push(endpoint);
            }
            Err(err) => tracing::error!("Probe task panicked: {}", err),
        }
    }

    tracing::info!(
        "Probe finished: {} working, {} failed",
        report.working.len(),
        report.failed.len()
    );
    report
}

async fn probe_endpoint(endpoint: &str, probe_url: &str) -> bool {
    let proxy = match reqwest::Proxy::all(proxy_url(endpoint)) {
        Ok(proxy) => proxy,
        Err(_) => return false,
    };

    let client = match Client::builder()
        .proxy(proxy)
        .timeout(PROBE_TIMEOUT)
        .danger_accept_invalid_certs(true)
        .build()
    {
        Ok(client) => client,
        Err(_) => return false,
    };

    match client.get(probe_url).send().await {
        Ok(response) => response.status().is_success(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dead_endpoints_all_fail() {
        // Loopback ports with nothing listening refuse connections quickly.
        let pool =
            ProxyPool::from_endpoints(vec!["127.0.0.1:1".to_string(), "127.0.0.1:2".to_string()])
                .unwrap();

        let report = check_proxies(&pool, "http://127.0.0.1:9/", 8).await;
        assert_eq!(report.working.len(), 0);
        assert_eq!(report.failed.len(), 2);
        assert_eq!(report.total(), 2);
    }

    #[tokio::test]
    async fn test_empty_pool_probes_nothing() {
        let pool = ProxyPool::new(None).unwrap();
        let report = check_proxies(&pool, "http://127.0.0.1:9/", 8).await;
        assert_eq!(report.total(), 0);
    }
}
