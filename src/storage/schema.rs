use anyhow::Result;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::str::FromStr;
use std::time::Duration;

use super::types::DatabaseError;

// ============================================================================
// Database
// ============================================================================

/// Owned handle to the local article cache.
///
/// Opened once at process start and passed (cheaply cloned) to whoever needs
/// it; there is no global singleton. All operations are async and go through
/// the shared connection pool.
#[derive(Clone)]
pub struct Database {
    pub(crate) pool: SqlitePool,
}

impl Database {
    /// Open a database connection and run migrations.
    ///
    /// Pass `:memory:` for an ephemeral store (used throughout the tests).
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Unavailable`] if the store cannot be opened
    /// and [`DatabaseError::Migration`] if the schema cannot be brought up to
    /// date. Callers should surface either as a visible error state rather
    /// than crash.
    pub async fn open(path: &str) -> Result<Self, DatabaseError> {
        let url = format!("sqlite:{}?mode=rwc", path);

        // busy_timeout=5000: SQLite waits up to 5 seconds for locks to release
        // before returning SQLITE_BUSY. Both settings are per-connection, so
        // they go on the connect options where every pooled connection
        // inherits them.
        let options = SqliteConnectOptions::from_str(&url)
            .map_err(|e| DatabaseError::Unavailable(e.to_string()))?
            .foreign_keys(true)
            .pragma("busy_timeout", "5000");

        // SQLite is single-writer; 5 connections covers concurrent readers
        // (list queries + unread counts + ingestion).
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(|e| DatabaseError::Unavailable(e.to_string()))?;

        let db = Self { pool };
        db.migrate()
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;
        Ok(db)
    }

    /// Close the pool, waiting for in-flight operations to finish.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Run database migrations atomically within a transaction.
    ///
    /// All schema changes are wrapped in a single transaction: if any step
    /// fails the migration rolls back, leaving the database in its previous
    /// consistent state. Every statement uses `IF NOT EXISTS`, so re-running
    /// against an existing database is a no-op.
    async fn migrate(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS feeds (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                url TEXT UNIQUE NOT NULL,
                created_at INTEGER NOT NULL
            )
        "#,
        )
        .execute(&mut *tx)
        .await?;

        // Nested authors/categories/image are JSON text columns.
        // url is the global natural key for dedup; unread defaults to 1 and
        // saved_for_later to 0 on insert.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS articles (
                id INTEGER PRIMARY KEY,
                feed_id INTEGER NOT NULL REFERENCES feeds(id) ON DELETE CASCADE,
                title TEXT NOT NULL,
                url TEXT UNIQUE NOT NULL,
                description TEXT,
                content TEXT,
                published INTEGER,
                updated INTEGER,
                authors TEXT NOT NULL DEFAULT '[]',
                categories TEXT NOT NULL DEFAULT '[]',
                image TEXT,
                unread INTEGER NOT NULL DEFAULT 1,
                saved_for_later INTEGER NOT NULL DEFAULT 0
            )
        "#,
        )
        .execute(&mut *tx)
        .await?;

        // Composite index for the hot list query: filter by feed_id, order by
        // published DESC (NULL published coalesces to 0 in queries).
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_articles_feed_published ON articles(feed_id, published DESC)",
        )
        .execute(&mut *tx)
        .await?;

        // Partial index for unread count aggregation
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_articles_unread ON articles(feed_id) WHERE unread = 1",
        )
        .execute(&mut *tx)
        .await?;

        // Saved-for-later library listing
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_articles_saved ON articles(saved_for_later, published DESC)",
        )
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }
}
