//! Per-article read/saved state transitions.
//!
//! Two independent boolean flags per article, four reachable states, every
//! transition always legal. All operations are idempotent (guarded UPDATE)
//! and a missing article id is a logged no-op, never an error the UI sees.

use super::schema::Database;
use super::types::DatabaseError;

impl Database {
    /// Mark an article as read. Returns whether anything changed.
    pub async fn mark_read(&self, article_id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE articles SET unread = 0 WHERE id = ? AND unread = 1")
            .bind(article_id)
            .execute(&self.pool)
            .await?;

        let changed = result.rows_affected() > 0;
        if !changed {
            tracing::debug!(article_id, "mark_read: no-op (missing or already read)");
        }
        Ok(changed)
    }

    /// Mark an article as unread. Returns whether anything changed.
    pub async fn mark_unread(&self, article_id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE articles SET unread = 1 WHERE id = ? AND unread = 0")
            .bind(article_id)
            .execute(&self.pool)
            .await?;

        let changed = result.rows_affected() > 0;
        if !changed {
            tracing::debug!(article_id, "mark_unread: no-op (missing or already unread)");
        }
        Ok(changed)
    }

    /// Bookmark an article for later. Returns whether anything changed.
    pub async fn set_saved_for_later(&self, article_id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE articles SET saved_for_later = 1 WHERE id = ? AND saved_for_later = 0",
        )
        .bind(article_id)
        .execute(&self.pool)
        .await?;

        let changed = result.rows_affected() > 0;
        if !changed {
            tracing::debug!(article_id, "set_saved_for_later: no-op");
        }
        Ok(changed)
    }

    /// Remove the saved-for-later bookmark. Returns whether anything changed.
    pub async fn clear_saved_for_later(&self, article_id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE articles SET saved_for_later = 0 WHERE id = ? AND saved_for_later = 1",
        )
        .bind(article_id)
        .execute(&self.pool)
        .await?;

        let changed = result.rows_affected() > 0;
        if !changed {
            tracing::debug!(article_id, "clear_saved_for_later: no-op");
        }
        Ok(changed)
    }

    /// Mark every unread article in a feed as read, returning the count
    /// marked. Used by the "mark all read" list action.
    pub async fn mark_all_read(&self, feed_id: i64) -> Result<u64, DatabaseError> {
        let result = sqlx::query("UPDATE articles SET unread = 0 WHERE feed_id = ? AND unread = 1")
            .bind(feed_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::{Database, NormalizedArticle};

    async fn test_db_with_article() -> (Database, i64, i64) {
        let db = Database::open(":memory:").await.unwrap();
        let feed = db.add_feed("Tech", "https://ex.com/rss").await.unwrap();
        db.upsert_articles(
            feed.id,
            &[NormalizedArticle {
                url: "https://ex.com/a1".to_string(),
                title: Some("A1".to_string()),
                description: None,
                content: None,
                published: None,
                updated: None,
                authors: Vec::new(),
                categories: Vec::new(),
                image: None,
            }],
        )
        .await;
        let articles = db.list_articles(feed.id, None, None).await.unwrap();
        let article_id = articles[0].id;
        (db, feed.id, article_id)
    }

    #[tokio::test]
    async fn test_mark_read_then_unread() {
        let (db, _, id) = test_db_with_article().await;

        assert!(db.mark_read(id).await.unwrap());
        assert!(!db.get_article(id).await.unwrap().unwrap().unread);

        // Idempotent: second call is a no-op
        assert!(!db.mark_read(id).await.unwrap());

        assert!(db.mark_unread(id).await.unwrap());
        assert!(db.get_article(id).await.unwrap().unwrap().unread);
    }

    #[tokio::test]
    async fn test_save_then_clear() {
        let (db, _, id) = test_db_with_article().await;

        assert!(db.set_saved_for_later(id).await.unwrap());
        assert!(db.get_article(id).await.unwrap().unwrap().saved_for_later);
        assert!(!db.set_saved_for_later(id).await.unwrap());

        assert!(db.clear_saved_for_later(id).await.unwrap());
        assert!(!db.get_article(id).await.unwrap().unwrap().saved_for_later);
    }

    #[tokio::test]
    async fn test_flags_are_independent() {
        let (db, _, id) = test_db_with_article().await;

        db.set_saved_for_later(id).await.unwrap();
        let article = db.get_article(id).await.unwrap().unwrap();
        assert!(article.unread, "saving must not touch read state");

        db.mark_read(id).await.unwrap();
        let article = db.get_article(id).await.unwrap().unwrap();
        assert!(article.saved_for_later, "marking read must not touch saved state");

        db.mark_unread(id).await.unwrap();
        db.clear_saved_for_later(id).await.unwrap();
        let article = db.get_article(id).await.unwrap().unwrap();
        assert!(article.unread);
        assert!(!article.saved_for_later);
    }

    #[tokio::test]
    async fn test_all_four_states_reachable() {
        let (db, _, id) = test_db_with_article().await;

        // unread × unsaved (initial)
        let a = db.get_article(id).await.unwrap().unwrap();
        assert!(a.unread && !a.saved_for_later);

        // unread × saved
        db.set_saved_for_later(id).await.unwrap();
        let a = db.get_article(id).await.unwrap().unwrap();
        assert!(a.unread && a.saved_for_later);

        // read × saved
        db.mark_read(id).await.unwrap();
        let a = db.get_article(id).await.unwrap().unwrap();
        assert!(!a.unread && a.saved_for_later);

        // read × unsaved
        db.clear_saved_for_later(id).await.unwrap();
        let a = db.get_article(id).await.unwrap().unwrap();
        assert!(!a.unread && !a.saved_for_later);
    }

    #[tokio::test]
    async fn test_missing_article_is_silent_noop() {
        let (db, _, _) = test_db_with_article().await;

        assert!(!db.mark_read(9999).await.unwrap());
        assert!(!db.mark_unread(9999).await.unwrap());
        assert!(!db.set_saved_for_later(9999).await.unwrap());
        assert!(!db.clear_saved_for_later(9999).await.unwrap());
    }

    #[tokio::test]
    async fn test_mark_all_read_scoped_to_feed() {
        let (db, feed_id, _) = test_db_with_article().await;
        let other = db.add_feed("Other", "https://o.example.com/rss").await.unwrap();
        db.upsert_articles(
            other.id,
            &[NormalizedArticle {
                url: "https://o.example.com/1".to_string(),
                title: Some("O1".to_string()),
                description: None,
                content: None,
                published: None,
                updated: None,
                authors: Vec::new(),
                categories: Vec::new(),
                image: None,
            }],
        )
        .await;

        let marked = db.mark_all_read(feed_id).await.unwrap();
        assert_eq!(marked, 1);
        assert_eq!(db.count_unread(Some(feed_id)).await.unwrap(), 0);
        assert_eq!(db.count_unread(Some(other.id)).await.unwrap(), 1);

        // Idempotent
        assert_eq!(db.mark_all_read(feed_id).await.unwrap(), 0);
    }
}
