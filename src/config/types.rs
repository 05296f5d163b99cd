use serde::Deserialize;

/// Main configuration structure for Gleaner
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
    pub output: OutputConfig,
    pub extract: ExtractConfig,
}

/// Target site configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Domain the crawl is confined to (matches the host itself and subdomains)
    #[serde(rename = "base-domain")]
    pub base_domain: String,

    /// Section/index pages the discovery crawl starts from
    #[serde(rename = "seed-urls")]
    pub seed_urls: Vec<String>,

    /// Regex over the URL path identifying individual article pages
    #[serde(rename = "article-pattern")]
    pub article_pattern: String,
}

/// Discovery crawl configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Maximum number of article URLs to collect per discovery run
    #[serde(rename = "max-articles")]
    pub max_articles: usize,

    /// Number of pages crawled concurrently within one round
    #[serde(rename = "worker-threads")]
    pub worker_threads: usize,
}

/// Request behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Fixed User-Agent header; when absent, one is rotated per request
    #[serde(rename = "user-agent", default)]
    pub user_agent: Option<String>,

    /// Proxied attempts per URL before the direct fallback
    #[serde(rename = "proxy-attempts-per-url", default = "default_proxy_attempts")]
    pub proxy_attempts_per_url: u32,

    /// Politeness delay before every request attempt (milliseconds)
    #[serde(rename = "request-delay-ms", default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
}

/// Proxy pool configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProxyConfig {
    /// URL serving a newline-delimited host:port proxy list; absent means
    /// every request goes direct
    #[serde(rename = "source-url", default)]
    pub source_url: Option<String>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite article ledger
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Optional log file; when absent, logs go to stderr only
    #[serde(rename = "log-path", default)]
    pub log_path: Option<String>,
}

/// Article extraction configuration (CSS selectors for the site layout)
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractConfig {
    /// Selector for the article headline
    #[serde(rename = "title-selector")]
    pub title_selector: String,

    /// Selector for the container holding the article body
    #[serde(rename = "body-selector")]
    pub body_selector: String,

    /// Selector for text elements inside the body container
    #[serde(rename = "paragraph-selector", default = "default_paragraph_selector")]
    pub paragraph_selector: String,

    /// Elements inside a match of this selector are excluded from the body
    #[serde(rename = "skip-selector", default)]
    pub skip_selector: Option<String>,
}

fn default_proxy_attempts() -> u32 {
    10
}

fn default_request_delay_ms() -> u64 {
    1000
}

fn default_paragraph_selector() -> String {
    "p, h2".to_string()
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: None,
            proxy_attempts_per_url: default_proxy_attempts(),
            request_delay_ms: default_request_delay_ms(),
        }
    }
}
