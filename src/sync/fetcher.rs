use crate::storage::NormalizedArticle;
use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;

/// Response bodies above this size are rejected outright.
const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors from one call to the external fetch collaborator.
///
/// Every variant is scoped to a single feed: the ingestion pipeline logs it
/// and moves on to the next feed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    Status(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Response body exceeded the size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
    /// Response body was not a JSON array of article records
    #[error("Malformed article payload: {0}")]
    Malformed(String),
}

/// Client for the external feed-fetch service.
///
/// The service accepts `POST {endpoint}?url={feed_url}` and replies with a
/// JSON array of normalized article records; it does the actual RSS/Atom
/// retrieval and XML parsing server-side.
#[derive(Clone)]
pub struct FetchClient {
    http: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl FetchClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            timeout,
        }
    }

    /// Use a preconfigured HTTP client (custom TLS, proxies, headers).
    pub fn with_client(
        http: reqwest::Client,
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            timeout,
        }
    }

    /// Fetch the current articles of one feed from the collaborator.
    ///
    /// Individually malformed records are skipped with a warning; only a
    /// payload that is not a JSON array at all fails the call. There is no
    /// retry here — a future refresh attempt is the retry.
    pub async fn fetch_articles(
        &self,
        feed_url: &str,
    ) -> Result<Vec<NormalizedArticle>, FetchError> {
        let request = self
            .http
            .post(&self.endpoint)
            .query(&[("url", feed_url)])
            .send();

        let response = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| FetchError::Timeout)?
            .map_err(FetchError::Transport)?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let bytes = read_limited_bytes(response, MAX_RESPONSE_SIZE).await?;

        let values: Vec<serde_json::Value> =
            serde_json::from_slice(&bytes).map_err(|e| FetchError::Malformed(e.to_string()))?;

        // Per-record fault isolation: one broken record never poisons the batch
        let mut articles = Vec::with_capacity(values.len());
        let mut skipped = 0usize;
        for value in values {
            match serde_json::from_value::<NormalizedArticle>(value) {
                Ok(article) if !article.url.is_empty() => articles.push(article),
                Ok(_) => skipped += 1,
                Err(e) => {
                    tracing::debug!(feed = %feed_url, error = %e, "Skipping malformed article record");
                    skipped += 1;
                }
            }
        }

        if skipped > 0 {
            tracing::warn!(
                feed = %feed_url,
                skipped,
                accepted = articles.len(),
                "Malformed article records skipped"
            );
        }

        Ok(articles)
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Capture Content-Length for the completeness check
    let expected_length = response.content_length();

    // Fast path: reject oversized bodies before streaming
    if let Some(len) = expected_length {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            // A connection dropped mid-body surfaces here as a stream error;
            // when Content-Length says bytes are missing, report the
            // truncation rather than the generic transport failure.
            Err(e) => {
                if let Some(expected) = expected_length {
                    if (bytes.len() as u64) < expected {
                        return Err(FetchError::IncompleteResponse {
                            expected,
                            received: bytes.len(),
                        });
                    }
                }
                return Err(FetchError::Transport(e));
            }
        };
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}
