use super::schema::Database;
use super::types::{Article, ArticleDbRow, DatabaseError, NormalizedArticle};

/// Milliseconds per day, for the retention cutoff.
const DAY_MS: i64 = 86_400_000;

fn encode_json<T: serde::Serialize>(value: &T) -> String {
    // Author/Category serialize infallibly; the fallback is for safety only.
    serde_json::to_string(value).unwrap_or_else(|_| "[]".to_string())
}

impl Database {
    // ========================================================================
    // Ingestion
    // ========================================================================

    /// Merge a batch of externally-parsed articles into the store.
    ///
    /// Insert-if-unseen by `url`: a record whose URL already exists is
    /// skipped entirely, so re-ingestion never duplicates rows and never
    /// touches `unread`/`saved_for_later` on existing articles.
    ///
    /// Best-effort by contract: a record that fails to insert (missing feed,
    /// storage hiccup) is logged and skipped, and the rest of the batch still
    /// lands. Returns the number of newly inserted articles.
    pub async fn upsert_articles(&self, feed_id: i64, articles: &[NormalizedArticle]) -> usize {
        let mut inserted = 0usize;
        let mut failed = 0usize;

        for article in articles {
            if article.url.is_empty() {
                tracing::warn!(feed_id, "Skipping article with empty url");
                failed += 1;
                continue;
            }

            let result = sqlx::query(
                r#"
                INSERT INTO articles
                    (feed_id, title, url, description, content, published, updated,
                     authors, categories, image)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(url) DO NOTHING
            "#,
            )
            .bind(feed_id)
            .bind(article.title.as_deref().unwrap_or_default())
            .bind(&article.url)
            .bind(&article.description)
            .bind(&article.content)
            .bind(article.published.map(|dt| dt.timestamp_millis()))
            .bind(article.updated.map(|dt| dt.timestamp_millis()))
            .bind(encode_json(&article.authors))
            .bind(encode_json(&article.categories))
            .bind(article.image.as_ref().map(encode_json))
            .execute(&self.pool)
            .await;

            match result {
                Ok(r) if r.rows_affected() > 0 => inserted += 1,
                Ok(_) => {} // url already cached, skip-not-fail
                Err(e) => {
                    tracing::warn!(feed_id, url = %article.url, error = %e, "Failed to insert article");
                    failed += 1;
                }
            }
        }

        tracing::debug!(
            feed_id,
            received = articles.len(),
            inserted,
            failed,
            "Article batch merged"
        );
        inserted
    }

    // ========================================================================
    // Article Queries
    // ========================================================================

    /// Get articles for a feed, newest first.
    ///
    /// Ordering is `published DESC` with undated articles sorting as epoch
    /// (older than anything dated) and `id` as a stable tiebreak. With no
    /// `limit` the full set is returned and `offset` is ignored — a page
    /// boundary requires an explicit size. Page N of size P is
    /// `offset = (N-1) * P`.
    ///
    /// Offsets are not isolated across calls: an ingest between two page
    /// fetches may shift row positions.
    pub async fn list_articles(
        &self,
        feed_id: i64,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Article>, DatabaseError> {
        let rows = match limit {
            Some(limit) => {
                sqlx::query_as::<_, ArticleDbRow>(
                    r#"
                    SELECT id, feed_id, title, url, description, content, published, updated,
                           authors, categories, image, unread, saved_for_later
                    FROM articles
                    WHERE feed_id = ?
                    ORDER BY COALESCE(published, 0) DESC, id DESC
                    LIMIT ? OFFSET ?
                "#,
                )
                .bind(feed_id)
                .bind(limit)
                .bind(offset.unwrap_or(0))
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                if offset.is_some() {
                    tracing::debug!(feed_id, "list_articles: offset without limit is ignored");
                }
                sqlx::query_as::<_, ArticleDbRow>(
                    r#"
                    SELECT id, feed_id, title, url, description, content, published, updated,
                           authors, categories, image, unread, saved_for_later
                    FROM articles
                    WHERE feed_id = ?
                    ORDER BY COALESCE(published, 0) DESC, id DESC
                "#,
                )
                .bind(feed_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.into_iter().map(ArticleDbRow::into_article).collect())
    }

    /// Saved-for-later articles across all feeds, newest first.
    pub async fn list_saved_articles(
        &self,
        limit: Option<i64>,
    ) -> Result<Vec<Article>, DatabaseError> {
        let rows = sqlx::query_as::<_, ArticleDbRow>(
            r#"
            SELECT id, feed_id, title, url, description, content, published, updated,
                   authors, categories, image, unread, saved_for_later
            FROM articles
            WHERE saved_for_later = 1
            ORDER BY COALESCE(published, 0) DESC, id DESC
            LIMIT ?
        "#,
        )
        .bind(limit.unwrap_or(-1))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ArticleDbRow::into_article).collect())
    }

    /// Point lookup; `None` if the article does not exist.
    pub async fn get_article(&self, article_id: i64) -> Result<Option<Article>, DatabaseError> {
        let row = sqlx::query_as::<_, ArticleDbRow>(
            r#"
            SELECT id, feed_id, title, url, description, content, published, updated,
                   authors, categories, image, unread, saved_for_later
            FROM articles
            WHERE id = ?
        "#,
        )
        .bind(article_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ArticleDbRow::into_article))
    }

    /// Total unread articles, optionally scoped to one feed.
    pub async fn count_unread(&self, feed_id: Option<i64>) -> Result<i64, DatabaseError> {
        let row: (i64,) = match feed_id {
            Some(feed_id) => {
                sqlx::query_as("SELECT COUNT(*) FROM articles WHERE feed_id = ? AND unread = 1")
                    .bind(feed_id)
                    .fetch_one(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_as("SELECT COUNT(*) FROM articles WHERE unread = 1")
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        Ok(row.0)
    }

    /// Total cached articles for a feed (page math for offset pagination).
    pub async fn count_articles(&self, feed_id: i64) -> Result<i64, DatabaseError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM articles WHERE feed_id = ?")
            .bind(feed_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    // ========================================================================
    // Deletion & Retention
    // ========================================================================

    /// Delete a single article by its URL. Returns whether it existed.
    pub async fn delete_article(&self, url: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM articles WHERE url = ?")
            .bind(url)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete all articles belonging to a feed, returning the count removed.
    pub async fn delete_articles_for_feed(&self, feed_id: i64) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM articles WHERE feed_id = ?")
            .bind(feed_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Retention sweep: delete articles published before the cutoff.
    ///
    /// Caller-invoked, not scheduled. Undated articles are never swept —
    /// there is nothing to age them by.
    pub async fn purge_older_than(&self, retention_days: u32) -> Result<u64, DatabaseError> {
        let cutoff = chrono::Utc::now().timestamp_millis() - i64::from(retention_days) * DAY_MS;

        let result =
            sqlx::query("DELETE FROM articles WHERE published IS NOT NULL AND published < ?")
                .bind(cutoff)
                .execute(&self.pool)
                .await?;

        let purged = result.rows_affected();
        if purged > 0 {
            tracing::info!(retention_days, purged, "Retention sweep removed articles");
        }
        Ok(purged)
    }
}
