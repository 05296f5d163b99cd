//! Storage module for the article ledger
//!
//! This module handles all database operations for the harvester, including:
//! - SQLite database initialization and schema management
//! - Article persistence with URL uniqueness
//! - The already-processed URL set fed to discovery
//! - Run tracking for the stats mode

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{ArticleStore, StorageError, StorageResult};

use std::path::Path;

/// Initializes or opens a ledger database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStore)` - Successfully initialized ledger
/// * `Err(HarvestError)` - Failed to initialize ledger
pub fn open_store(path: &Path) -> crate::Result<SqliteStore> {
    SqliteStore::new(path)
}

/// Represents a saved article in the database
#[derive(Debug, Clone)]
pub struct ArticleRecord {
    pub id: i64,
    pub url: String,
    pub title: Option<String>,
    pub body: String,
    pub word_count: u64,
    pub fetched_at: String,
}

/// Represents a harvest run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub seeds: u32,
    pub discovered: u64,
    pub saved: u64,
    pub status: RunStatus,
}

/// Status of a harvest run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
