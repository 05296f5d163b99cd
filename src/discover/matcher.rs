//! Content-URL matching
//!
//! Decides which links count as article pages: the host must belong to
//! the configured site and the URL path must match the configured article
//! pattern. Everything else (section indexes, galleries, off-site links)
//! is ignored by the crawl.

use crate::{ConfigError, ConfigResult};
use regex::Regex;
use url::Url;

/// Predicate identifying article pages on the target site
#[derive(Debug, Clone)]
pub struct ArticleMatcher {
    domain: String,
    pattern: Regex,
}

impl ArticleMatcher {
    /// Builds a matcher for `base_domain` with a path regex
    ///
    /// # Arguments
    ///
    /// * `base_domain` - Site host; subdomains of it also count as on-site
    /// * `pattern` - Regex applied to the URL path (search, not anchored)
    pub fn new(base_domain: &str, pattern: &str) -> ConfigResult<Self> {
        let pattern = Regex::new(pattern).map_err(|e| {
            ConfigError::InvalidPattern(format!("article pattern '{}': {}", pattern, e))
        })?;

        Ok(Self {
            domain: base_domain.to_ascii_lowercase(),
            pattern,
        })
    }

    /// True when the URL is site-internal and its path matches the pattern
    pub fn is_article(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };

        self.is_site_host(host) && self.pattern.is_match(parsed.path())
    }

    fn is_site_host(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        host == self.domain || host.ends_with(&format!(".{}", self.domain))
    }
}
