//! Local article cache and synchronization layer for an RSS reader.
//!
//! The UI screens, the remote feed-fetching/XML-parsing service, and
//! authentication are external collaborators. This crate owns what sits
//! between them: a persisted feed registry, a deduplicated article store
//! with per-article read/saved state, and a best-effort ingestion pipeline
//! that merges externally-parsed articles without clobbering local state.
//!
//! ```no_run
//! use feedstash::storage::Database;
//! use feedstash::sync::{refresh_subscribed, FetchClient};
//! use std::time::Duration;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let db = Database::open("feedstash.db").await?;
//! let fetch = FetchClient::new("https://api.example.com/fetch-rss", Duration::from_secs(30));
//!
//! let feed = db.add_feed("Tech", "https://ex.com/rss").await?;
//! refresh_subscribed(&db, &fetch).await;
//!
//! let page = db.list_articles(feed.id, Some(20), Some(0)).await?;
//! let unread = db.count_unread(Some(feed.id)).await?;
//! # let _ = (page, unread);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod storage;
pub mod sync;
pub mod util;

pub use config::Config;
pub use storage::{Article, Database, DatabaseError, Feed, NormalizedArticle};
pub use sync::{FetchClient, FetchError, RefreshOutcome};
