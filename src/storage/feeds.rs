use super::schema::Database;
use super::types::{is_unique_violation, DatabaseError, Feed};
use crate::util::validate_feed_url;

impl Database {
    // ========================================================================
    // Feed Registry
    // ========================================================================

    /// Subscribe to a feed.
    ///
    /// # Errors
    ///
    /// [`DatabaseError::DuplicateFeed`] if the URL is already registered,
    /// [`DatabaseError::InvalidFeedUrl`] if it is not a parsable http(s) URL.
    pub async fn add_feed(&self, title: &str, url: &str) -> Result<Feed, DatabaseError> {
        validate_feed_url(url).map_err(|e| DatabaseError::InvalidFeedUrl(e.to_string()))?;

        let now = chrono::Utc::now().timestamp_millis();
        let feed = sqlx::query_as::<_, Feed>(
            r#"
            INSERT INTO feeds (title, url, created_at)
            VALUES (?, ?, ?)
            RETURNING id, title, url, created_at
        "#,
        )
        .bind(title)
        .bind(url)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DatabaseError::DuplicateFeed(url.to_string())
            } else {
                DatabaseError::Other(e)
            }
        })?;

        tracing::info!(feed_id = feed.id, url = %feed.url, "Feed subscribed");
        Ok(feed)
    }

    /// Edit a feed's title and URL. Returns whether the feed existed.
    pub async fn update_feed(
        &self,
        feed_id: i64,
        title: &str,
        url: &str,
    ) -> Result<bool, DatabaseError> {
        validate_feed_url(url).map_err(|e| DatabaseError::InvalidFeedUrl(e.to_string()))?;

        let result = sqlx::query("UPDATE feeds SET title = ?, url = ? WHERE id = ?")
            .bind(title)
            .bind(url)
            .bind(feed_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DatabaseError::DuplicateFeed(url.to_string())
                } else {
                    DatabaseError::Other(e)
                }
            })?;

        Ok(result.rows_affected() > 0)
    }

    /// Get all subscribed feeds, in stable subscription order.
    pub async fn list_feeds(&self) -> Result<Vec<Feed>, DatabaseError> {
        let feeds = sqlx::query_as::<_, Feed>(
            "SELECT id, title, url, created_at FROM feeds ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(feeds)
    }

    /// Point lookup; `None` if the feed does not exist.
    pub async fn get_feed(&self, feed_id: i64) -> Result<Option<Feed>, DatabaseError> {
        let feed = sqlx::query_as::<_, Feed>(
            "SELECT id, title, url, created_at FROM feeds WHERE id = ?",
        )
        .bind(feed_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(feed)
    }

    /// Unsubscribe a feed, deleting its articles in the same transaction.
    ///
    /// Either the feed row and all of its articles are removed, or neither
    /// is. Returns whether the feed existed.
    pub async fn remove_feed(&self, feed_id: i64) -> Result<bool, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let articles = sqlx::query("DELETE FROM articles WHERE feed_id = ?")
            .bind(feed_id)
            .execute(&mut *tx)
            .await?;

        let feeds = sqlx::query("DELETE FROM feeds WHERE id = ?")
            .bind(feed_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let removed = feeds.rows_affected() > 0;
        if removed {
            tracing::info!(
                feed_id,
                articles_removed = articles.rows_affected(),
                "Feed unsubscribed"
            );
        } else {
            tracing::debug!(feed_id, "remove_feed: no such feed");
        }
        Ok(removed)
    }

    /// Number of subscribed feeds.
    pub async fn count_feeds(&self) -> Result<i64, DatabaseError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM feeds")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }
}
