use super::types::{Article, Category};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while fetching a page of headlines.
///
/// The controller doesn't distinguish transient from permanent failures; every
/// variant is surfaced the same way through its `Display` text.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code and no NewsAPI error body
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the 30-second timeout
    #[error("Request timed out")]
    Timeout,
    /// NewsAPI reported `status: "error"` (bad key, rate limit, bad parameter)
    #[error("{message} ({code})")]
    Api { code: String, message: String },
    /// Body was not a valid top-headlines response
    #[error("Parse error: {0}")]
    Parse(String),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
}

/// Source of paged headlines.
///
/// `page` starts at 1 and `page_size` is always positive. A page shorter than
/// `page_size` (including an empty one) means there is nothing after it.
/// Implementations don't retry; the caller decides what a failure means.
pub trait HeadlineFetcher: Send + Sync {
    fn fetch(
        &self,
        category: Category,
        page: u32,
        page_size: u32,
    ) -> impl Future<Output = Result<Vec<Article>, FetchError>> + Send;
}

impl<T: HeadlineFetcher> HeadlineFetcher for Arc<T> {
    fn fetch(
        &self,
        category: Category,
        page: u32,
        page_size: u32,
    ) -> impl Future<Output = Result<Vec<Article>, FetchError>> + Send {
        (**self).fetch(category, page, page_size)
    }
}
