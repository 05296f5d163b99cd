//! Gleaner: a single-site article harvester
//!
//! This crate implements a budgeted breadth-first crawl that discovers
//! article pages on one news site, fetching through a rotating proxy pool
//! with quarantine and a direct-connection fallback, then scrapes and
//! persists each discovered article into a SQLite ledger.

pub mod config;
pub mod discover;
pub mod extract;
pub mod fetch;
pub mod harvest;
pub mod proxy;
pub mod storage;

use thiserror::Error;

/// Main error type for harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid article pattern: {0}")]
    InvalidPattern(String),
}

/// Result type alias for harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use discover::{Discovery, DiscoveryEngine};
pub use extract::{Article, ContentExtractor};
pub use fetch::{FetchedPage, ResilientFetcher};
pub use harvest::HarvestReport;
pub use proxy::ProxyPool;
pub use storage::{ArticleStore, SqliteStore};
