mod url;

pub use url::{validate_feed_url, FeedUrlError};
