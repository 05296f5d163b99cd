//! SQLite ledger implementation
//!
//! This module provides the SQLite-based implementation of the
//! ArticleStore trait.

use crate::extract::Article;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{ArticleStore, StorageError, StorageResult};
use crate::storage::{ArticleRecord, RunRecord, RunStatus};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;
use std::path::Path;

/// SQLite ledger backend
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Creates a new SqliteStore instance
    ///
    /// Missing parent directories of the database path are created.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(HarvestError)` - Failed to open database
    pub fn new(path: &Path) -> crate::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        // Initialize schema
        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> crate::Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl ArticleStore for SqliteStore {
    // ===== Ledger =====

    fn processed_urls(&self) -> StorageResult<HashSet<String>> {
        let mut stmt = self.conn.prepare("SELECT url FROM articles")?;

        let urls = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<HashSet<String>, _>>()?;

        Ok(urls)
    }

    fn save_article(&mut self, article: &Article) -> StorageResult<bool> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO articles (url, title, body, word_count, fetched_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                article.url,
                article.title,
                article.body,
                article.word_count as i64,
                now
            ],
        )?;

        Ok(changed > 0)
    }

    fn get_article(&self, url: &str) -> StorageResult<Option<ArticleRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, url, title, body, word_count, fetched_at FROM articles WHERE url = ?1",
        )?;

        let article = stmt
            .query_row(params![url], |row| {
                Ok(ArticleRecord {
                    id: row.get(0)?,
                    url: row.get(1)?,
                    title: row.get(2)?,
                    body: row.get(3)?,
                    word_count: row.get::<_, i64>(4)? as u64,
                    fetched_at: row.get(5)?,
                })
            })
            .optional()?;

        Ok(article)
    }

    fn count_articles(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn total_word_count(&self) -> StorageResult<u64> {
        let total: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(word_count), 0) FROM articles",
            [],
            |row| row.get(0),
        )?;
        Ok(total as u64)
    }

    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str, seeds: u32) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, seeds, status) VALUES (?1, ?2, ?3, ?4)",
            params![now, config_hash, seeds, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn complete_run(
        &mut self,
        run_id: i64,
        discovered: u64,
        saved: u64,
        status: RunStatus,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE runs SET finished_at = ?1, discovered = ?2, saved = ?3, status = ?4
             WHERE id = ?5",
            params![
                now,
                discovered as i64,
                saved as i64,
                status.to_db_string(),
                run_id
            ],
        )?;

        if changed == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let mut stmt = self.conn.prepare(
            "SELECT id, started_at, finished_at, config_hash, seeds, discovered, saved, status
             FROM runs WHERE id = ?1",
        )?;

        let run = stmt
            .query_row(params![run_id], |row| {
                Ok(RunRecord {
                    id: row.get(0)?,
                    started_at: row.get(1)?,
                    finished_at: row.get(2)?,
                    config_hash: row.get(3)?,
                    seeds: row.get(4)?,
                    discovered: row.get::<_, i64>(5)? as u64,
                    saved: row.get::<_, i64>(6)? as u64,
                    status: RunStatus::from_db_string(&row.get::<_, String>(7)?)
                        .unwrap_or(RunStatus::Running),
                })
            })
            .map_err(|_| StorageError::RunNotFound(run_id))?;

        Ok(run)
    }

    fn recent_runs(&self, limit: u32) -> StorageResult<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, started_at, finished_at, config_hash, seeds, discovered, saved, status
             FROM runs ORDER BY id DESC LIMIT ?1",
        )?;

        let runs = stmt
            .query_map(params![limit], |row| {
                Ok(RunRecord {
                    id: row.get(0)?,
                    started_at: row.get(1)?,
                    finished_at: row.get(2)?,
                    config_hash: row.get(3)?,
                    seeds: row.get(4)?,
                    discovered: row.get::<_, i64>(5)? as u64,
                    saved: row.get::<_, i64>(6)? as u64,
                    status: RunStatus::from_db_string(&row.get::<_, String>(7)?)
                        .unwrap_or(RunStatus::Running),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(runs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_article(url: &str) -> Article {
        Article {
            url: url.to_string(),
            title: Some("A headline".to_string()),
            body: "First paragraph.\n\nSecond paragraph.".to_string(),
            word_count: 4,
        }
    }

    #[test]
    fn test_save_and_get_article() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let article = sample_article("https://news.example.com/news/a/2024/01/");

        assert!(store.save_article(&article).unwrap());

        let record = store.get_article(&article.url).unwrap().unwrap();
        assert_eq!(record.url, article.url);
        assert_eq!(record.title, article.title);
        assert_eq!(record.body, article.body);
        assert_eq!(record.word_count, 4);
        assert!(!record.fetched_at.is_empty());
    }

    #[test]
    fn test_get_missing_article() {
        let store = SqliteStore::new_in_memory().unwrap();
        let found = store.get_article("https://news.example.com/nope/").unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_duplicate_url_is_not_saved_twice() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let article = sample_article("https://news.example.com/news/a/2024/01/");

        assert!(store.save_article(&article).unwrap());
        assert!(!store.save_article(&article).unwrap());
        assert_eq!(store.count_articles().unwrap(), 1);
    }

    #[test]
    fn test_null_title_roundtrip() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let mut article = sample_article("https://news.example.com/news/b/2024/02/");
        article.title = None;

        store.save_article(&article).unwrap();
        let record = store.get_article(&article.url).unwrap().unwrap();
        assert_eq!(record.title, None);
    }

    #[test]
    fn test_processed_urls_reflects_saves() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        assert!(store.processed_urls().unwrap().is_empty());

        store
            .save_article(&sample_article("https://news.example.com/news/a/2024/01/"))
            .unwrap();
        store
            .save_article(&sample_article("https://news.example.com/news/b/2024/02/"))
            .unwrap();

        let processed = store.processed_urls().unwrap();
        assert_eq!(processed.len(), 2);
        assert!(processed.contains("https://news.example.com/news/a/2024/01/"));
        assert!(processed.contains("https://news.example.com/news/b/2024/02/"));
    }

    #[test]
    fn test_total_word_count_sums_articles() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        assert_eq!(store.total_word_count().unwrap(), 0);

        store
            .save_article(&sample_article("https://news.example.com/news/a/2024/01/"))
            .unwrap();
        store
            .save_article(&sample_article("https://news.example.com/news/b/2024/02/"))
            .unwrap();

        assert_eq!(store.total_word_count().unwrap(), 8);
    }

    #[test]
    fn test_create_and_complete_run() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let run_id = store.create_run("abc123", 2).unwrap();

        let run = store.get_run(run_id).unwrap();
        assert_eq!(run.config_hash, "abc123");
        assert_eq!(run.seeds, 2);
        assert_eq!(run.status, RunStatus::Running);
        assert!(run.finished_at.is_none());

        store
            .complete_run(run_id, 10, 7, RunStatus::Completed)
            .unwrap();

        let run = store.get_run(run_id).unwrap();
        assert_eq!(run.discovered, 10);
        assert_eq!(run.saved, 7);
        assert_eq!(run.status, RunStatus::Completed);
        assert!(run.finished_at.is_some());
    }

    #[test]
    fn test_complete_unknown_run_fails() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let result = store.complete_run(42, 0, 0, RunStatus::Completed);
        assert!(matches!(result, Err(StorageError::RunNotFound(42))));
    }

    #[test]
    fn test_recent_runs_newest_first() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let first = store.create_run("hash-1", 1).unwrap();
        let second = store.create_run("hash-2", 1).unwrap();
        let third = store.create_run("hash-3", 1).unwrap();

        let runs = store.recent_runs(2).unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].id, third);
        assert_eq!(runs[1].id, second);
        assert!(first < second);
    }
}
