//! Page record persistence
//!
//! Backends store one [`PageRecord`] per normalized page URL. The in-memory
//! backend serves tests and ephemeral servers; the SQLite backend keeps the
//! highlight list as a JSON column.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::types::{HighlightRecord, PageRecord};

/// Errors from the highlight store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid page URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("No highlights stored for {0}")]
    PageNotFound(String),

    #[error("Highlight not found: {0}")]
    HighlightNotFound(Uuid),

    #[error("Highlight index {index} out of range (page has {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, StoreError>;

// ============================================================================
// Backend Trait
// ============================================================================

/// Key-value persistence for page records
#[async_trait]
pub trait PageStore: Send + Sync {
    /// Fetch the record for a page
    async fn get(&self, url: &str) -> Result<Option<PageRecord>>;

    /// Replace the record for a page
    async fn set(&self, url: &str, page: &PageRecord) -> Result<()>;

    /// All stored pages, ordered by URL
    async fn list(&self) -> Result<Vec<(String, PageRecord)>>;

    /// Drop a page; returns whether it existed
    async fn remove(&self, url: &str) -> Result<bool>;
}

// ============================================================================
// Memory Backend
// ============================================================================

/// In-memory backend
#[derive(Default)]
pub struct MemoryPageStore {
    pages: RwLock<BTreeMap<String, PageRecord>>,
}

impl MemoryPageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PageStore for MemoryPageStore {
    async fn get(&self, url: &str) -> Result<Option<PageRecord>> {
        Ok(self.pages.read().await.get(url).cloned())
    }

    async fn set(&self, url: &str, page: &PageRecord) -> Result<()> {
        self.pages
            .write()
            .await
            .insert(url.to_string(), page.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<(String, PageRecord)>> {
        Ok(self
            .pages
            .read()
            .await
            .iter()
            .map(|(url, page)| (url.clone(), page.clone()))
            .collect())
    }

    async fn remove(&self, url: &str) -> Result<bool> {
        Ok(self.pages.write().await.remove(url).is_some())
    }
}

// ============================================================================
// SQLite Backend
// ============================================================================

/// Create a connection pool for the SQLite backend
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// SQLite backend
pub struct SqlitePageStore {
    pool: SqlitePool,
}

/// Internal row type for SQLite queries
#[derive(sqlx::FromRow)]
struct PageRow {
    url: String,
    title: String,
    highlights_json: String,
}

impl PageRow {
    fn into_page(self) -> Result<(String, PageRecord)> {
        let highlights: Vec<HighlightRecord> = serde_json::from_str(&self.highlights_json)?;
        Ok((
            self.url,
            PageRecord {
                title: self.title,
                highlights,
            },
        ))
    }
}

impl SqlitePageStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the pages table
    pub async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS pages (
                url TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                highlights_json TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl PageStore for SqlitePageStore {
    async fn get(&self, url: &str) -> Result<Option<PageRecord>> {
        let row = sqlx::query_as::<_, PageRow>(
            r#"
            SELECT url, title, highlights_json
            FROM pages
            WHERE url = ?
            "#,
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_page().map(|(_, page)| page)).transpose()
    }

    async fn set(&self, url: &str, page: &PageRecord) -> Result<()> {
        let highlights_json = serde_json::to_string(&page.highlights)?;

        sqlx::query(
            r#"
            INSERT INTO pages (url, title, highlights_json, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(url) DO UPDATE SET
                title = excluded.title,
                highlights_json = excluded.highlights_json,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(url)
        .bind(&page.title)
        .bind(&highlights_json)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<(String, PageRecord)>> {
        let rows = sqlx::query_as::<_, PageRow>(
            r#"
            SELECT url, title, highlights_json
            FROM pages
            ORDER BY url ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_page()).collect()
    }

    async fn remove(&self, url: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM pages WHERE url = ?")
            .bind(url)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
