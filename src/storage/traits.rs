//! Storage traits and error types
//!
//! This module defines the trait interface for ledger backends and
//! associated error types.

use crate::extract::Article;
use crate::storage::{ArticleRecord, RunRecord, RunStatus};
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for article ledger backends
///
/// Discovery and orchestration depend on this trait rather than on the
/// SQLite implementation, so tests and alternate sinks can plug in.
pub trait ArticleStore {
    // ===== Ledger =====

    /// Loads the URLs of every article already saved
    ///
    /// This set feeds the discovery engine: a URL in it is never
    /// collected or scraped again.
    fn processed_urls(&self) -> StorageResult<HashSet<String>>;

    /// Persists one article
    ///
    /// # Arguments
    ///
    /// * `article` - The extracted article to save
    ///
    /// # Returns
    ///
    /// `true` when a new row was written, `false` when the URL was
    /// already in the ledger and the insert was a no-op.
    fn save_article(&mut self, article: &Article) -> StorageResult<bool>;

    /// Gets a saved article by URL
    fn get_article(&self, url: &str) -> StorageResult<Option<ArticleRecord>>;

    /// Counts saved articles
    fn count_articles(&self) -> StorageResult<u64>;

    /// Sums the word counts of all saved articles
    fn total_word_count(&self) -> StorageResult<u64>;

    // ===== Run Management =====

    /// Creates a new harvest run
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    /// * `seeds` - Number of seed URLs in this run
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str, seeds: u32) -> StorageResult<i64>;

    /// Finishes a run, recording its counts and final status
    fn complete_run(
        &mut self,
        run_id: i64,
        discovered: u64,
        saved: u64,
        status: RunStatus,
    ) -> StorageResult<()>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent runs, newest first
    fn recent_runs(&self, limit: u32) -> StorageResult<Vec<RunRecord>>;
}
