use thiserror::Error;
use url::Url;

/// Errors from subscription URL validation.
#[derive(Error, Debug)]
pub enum FeedUrlError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    Invalid(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
}

/// Validate a URL string for use as a feed subscription.
///
/// The store never dereferences this URL itself (the external fetch service
/// does), so validation is limited to shape: parsable, http or https.
pub fn validate_feed_url(url_str: &str) -> Result<Url, FeedUrlError> {
    let url = Url::parse(url_str)?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(FeedUrlError::UnsupportedScheme(scheme.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_urls() {
        assert!(validate_feed_url("https://example.com/feed.xml").is_ok());
        assert!(validate_feed_url("http://news.example.org").is_ok());
        assert!(validate_feed_url("http://127.0.0.1:8080/rss").is_ok());
    }

    #[test]
    fn test_invalid_schemes() {
        assert!(matches!(
            validate_feed_url("file:///etc/passwd"),
            Err(FeedUrlError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            validate_feed_url("ftp://example.com"),
            Err(FeedUrlError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn test_unparsable() {
        assert!(matches!(
            validate_feed_url("not a url"),
            Err(FeedUrlError::Invalid(_))
        ));
        assert!(validate_feed_url("").is_err());
    }
}
