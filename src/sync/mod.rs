//! Ingestion pipeline: bridge between the external fetch collaborator and
//! the article store.
//!
//! Refresh is caller-invoked (the UI triggers it on mount), not a background
//! job. Every failure is scoped to its feed: it lands in that feed's
//! [`RefreshOutcome`] as a logged error and never propagates past the
//! pipeline, so one dead feed cannot block ingestion of the others.

mod fetcher;

pub use fetcher::{FetchClient, FetchError};

use crate::storage::{Database, Feed};
use futures::stream::{self, StreamExt};

/// Feeds refreshed simultaneously. Each feed only touches rows scoped to its
/// own feed_id, so no cross-feed locking is needed.
const MAX_CONCURRENT_REFRESHES: usize = 4;

/// Result of refreshing a single feed.
pub struct RefreshOutcome {
    /// Database ID of the feed that was refreshed
    pub feed_id: i64,
    /// Number of new articles inserted, or the error that occurred
    pub result: Result<usize, FetchError>,
}

/// Refresh one feed: fetch its current articles and merge them into the
/// store. Already-seen URLs are no-ops; new ones land unread and unsaved.
pub async fn refresh_one(db: &Database, fetch: &FetchClient, feed: &Feed) -> RefreshOutcome {
    let result = match fetch.fetch_articles(&feed.url).await {
        Ok(articles) => {
            let inserted = db.upsert_articles(feed.id, &articles).await;
            tracing::info!(
                feed_id = feed.id,
                url = %feed.url,
                fetched = articles.len(),
                inserted,
                "Feed refreshed"
            );
            Ok(inserted)
        }
        Err(e) => {
            tracing::warn!(feed_id = feed.id, url = %feed.url, error = %e, "Feed refresh failed");
            Err(e)
        }
    };

    RefreshOutcome {
        feed_id: feed.id,
        result,
    }
}

/// Refresh a set of feeds with bounded concurrency.
///
/// Outcomes are returned in completion order, not input order.
pub async fn refresh_all(
    db: &Database,
    fetch: &FetchClient,
    feeds: &[Feed],
) -> Vec<RefreshOutcome> {
    if feeds.is_empty() {
        return Vec::new();
    }

    stream::iter(feeds)
        .map(|feed| refresh_one(db, fetch, feed))
        .buffer_unordered(MAX_CONCURRENT_REFRESHES)
        .collect()
        .await
}

/// Refresh every subscribed feed.
///
/// This is the UI-mount entry point: registry supplies the feed list, each
/// feed is ingested, and the caller re-queries the store for fresh lists and
/// counts. If the registry itself cannot be read, the error is logged and an
/// empty outcome list is returned (safe fallback, no crash).
pub async fn refresh_subscribed(db: &Database, fetch: &FetchClient) -> Vec<RefreshOutcome> {
    let feeds = match db.list_feeds().await {
        Ok(feeds) => feeds,
        Err(e) => {
            tracing::warn!(error = %e, "Could not load subscribed feeds for refresh");
            return Vec::new();
        }
    };

    refresh_all(db, fetch, &feeds).await
}
