use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Storage-layer errors with user-friendly messages.
///
/// Absence of a row is never an error: point lookups return `Option` and
/// mutations return `Ok(false)`, so callers can render empty states without
/// error handling. Only constraint violations on feeds and storage
/// initialization failures surface here.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The underlying store failed to open or initialize
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// A feed with this URL is already registered
    #[error("Feed already subscribed: {0}")]
    DuplicateFeed(String),

    /// The subscription URL is not a valid http(s) URL
    #[error("Invalid feed URL: {0}")]
    InvalidFeedUrl(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

/// Check whether a sqlx error is a UNIQUE constraint violation.
///
/// SQLite reports these as SQLITE_CONSTRAINT_UNIQUE with a message naming
/// the violated column, e.g. "UNIQUE constraint failed: feeds.url".
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.message().contains("UNIQUE constraint failed"),
        _ => false,
    }
}

// ============================================================================
// Wire Types (fetch collaborator)
// ============================================================================

/// Article author as delivered by the fetch collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub link: String,
}

/// Article category/tag as delivered by the fetch collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub term: String,
    #[serde(default)]
    pub url: String,
}

/// Lead image for an article.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Image {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
}

/// A normalized article record as returned by the external fetch service.
///
/// The collaborator parses the feed XML server-side and returns a JSON array
/// of these. `url` is the natural dedup key; everything else is optional and
/// defaulted so a sparse record still deserializes.
#[derive(Debug, Clone, Deserialize)]
pub struct NormalizedArticle {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub published: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub authors: Vec<Author>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub image: Option<Image>,
}

/// Deserialize an ISO timestamp leniently.
///
/// The collaborator emits RFC 3339 strings, but feeds in the wild produce
/// bare dates and garbage. An unparsable value degrades to `None` (the
/// article then sorts as oldest) instead of failing the whole record.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }

    // Bare date (e.g. "2024-01-01") → midnight UTC
    if let Ok(date) = NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(Some(dt.and_utc()));
        }
    }

    tracing::debug!(value = %raw, "Unparsable timestamp, treating as absent");
    Ok(None)
}

// ============================================================================
// Helper Types
// ============================================================================

/// Internal row type for Article queries (used by sqlx FromRow).
///
/// The nested `authors`/`categories`/`image` values live in JSON text
/// columns; `into_article()` decodes them. Corrupt JSON degrades to empty
/// collections rather than failing the query.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ArticleDbRow {
    pub id: i64,
    pub feed_id: i64,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub published: Option<i64>,
    pub updated: Option<i64>,
    pub authors: String,
    pub categories: String,
    pub image: Option<String>,
    pub unread: bool,
    pub saved_for_later: bool,
}

impl ArticleDbRow {
    pub(crate) fn into_article(self) -> Article {
        Article {
            id: self.id,
            feed_id: self.feed_id,
            title: self.title,
            url: self.url,
            description: self.description,
            content: self.content,
            published: self.published,
            updated: self.updated,
            authors: decode_json_column(self.id, "authors", &self.authors),
            categories: decode_json_column(self.id, "categories", &self.categories),
            image: self
                .image
                .as_deref()
                .and_then(|raw| match serde_json::from_str(raw) {
                    Ok(image) => Some(image),
                    Err(e) => {
                        tracing::warn!(article_id = self.id, error = %e, "Corrupt image column");
                        None
                    }
                }),
            unread: self.unread,
            saved_for_later: self.saved_for_later,
        }
    }
}

fn decode_json_column<T: serde::de::DeserializeOwned + Default>(
    article_id: i64,
    column: &str,
    raw: &str,
) -> T {
    match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(article_id, column, error = %e, "Corrupt JSON column, using empty value");
            T::default()
        }
    }
}

// ============================================================================
// Data Structures
// ============================================================================

/// A subscribed feed source.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Feed {
    pub id: i64,
    pub title: String,
    pub url: String,
    /// Unix milliseconds at subscription time
    pub created_at: i64,
}

/// A cached article.
///
/// `published`/`updated` are unix milliseconds. Articles without a
/// `published` value sort as older than any dated article.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub id: i64,
    pub feed_id: i64,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub published: Option<i64>,
    pub updated: Option<i64>,
    pub authors: Vec<Author>,
    pub categories: Vec<Category>,
    pub image: Option<Image>,
    pub unread: bool,
    pub saved_for_later: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_article_full_record() {
        let raw = serde_json::json!({
            "title": "Hello",
            "url": "https://example.com/hello",
            "description": "desc",
            "content": "<p>body</p>",
            "published": "2024-01-02T10:30:00Z",
            "updated": "2024-01-03T00:00:00+02:00",
            "authors": [{"name": "Jo", "email": "jo@example.com", "link": ""}],
            "categories": [{"label": "Tech", "term": "tech", "url": ""}],
            "image": {"url": "https://example.com/i.png", "title": "cover"}
        });

        let article: NormalizedArticle = serde_json::from_value(raw).unwrap();
        assert_eq!(article.url, "https://example.com/hello");
        assert_eq!(article.title.as_deref(), Some("Hello"));
        assert_eq!(article.authors.len(), 1);
        assert_eq!(article.authors[0].name, "Jo");
        assert!(article.published.is_some());
        assert!(article.updated.is_some());
        assert_eq!(article.image.as_ref().unwrap().title, "cover");
    }

    #[test]
    fn test_normalized_article_sparse_record() {
        let raw = serde_json::json!({ "url": "https://example.com/sparse" });
        let article: NormalizedArticle = serde_json::from_value(raw).unwrap();
        assert!(article.title.is_none());
        assert!(article.published.is_none());
        assert!(article.authors.is_empty());
        assert!(article.image.is_none());
    }

    #[test]
    fn test_lenient_timestamp_bare_date() {
        let raw = serde_json::json!({ "url": "u", "published": "2024-01-01" });
        let article: NormalizedArticle = serde_json::from_value(raw).unwrap();
        let dt = article.published.unwrap();
        assert_eq!(dt.timestamp_millis(), 1_704_067_200_000);
    }

    #[test]
    fn test_lenient_timestamp_garbage_degrades_to_none() {
        let raw = serde_json::json!({ "url": "u", "published": "Unknown date" });
        let article: NormalizedArticle = serde_json::from_value(raw).unwrap();
        assert!(article.published.is_none());
    }

    #[test]
    fn test_missing_url_fails_record() {
        let raw = serde_json::json!({ "title": "no url" });
        assert!(serde_json::from_value::<NormalizedArticle>(raw).is_err());
    }
}
