use super::fetcher::{FetchError, HeadlineFetcher};
use super::types::{Article, Category, NewsResponse};
use crate::util::strip_control_chars;
use futures::StreamExt;
use reqwest::redirect::Policy;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use url::Url;

/// Public NewsAPI endpoint; overridable in config for proxies and tests.
pub const DEFAULT_BASE_URL: &str = "https://newsapi.org";

const TOP_HEADLINES_PATH: &str = "v2/top-headlines";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024; // 10MB

// ============================================================================
// HTTP Client Configuration
// ============================================================================

/// Create a custom redirect policy with loop detection and limited hops.
///
/// - Limits redirects to 3 hops maximum
/// - Detects redirect loops (same URL appearing twice in chain)
fn create_redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= 3 {
            return attempt.error("Too many redirects (max 3)");
        }

        let url = attempt.url();
        for prev in attempt.previous() {
            if prev.as_str() == url.as_str() {
                return attempt.error("Redirect loop detected");
            }
        }

        tracing::debug!(
            from = %attempt.previous().last().map(|u| u.as_str()).unwrap_or("initial"),
            to = %url,
            hop = attempt.previous().len() + 1,
            "Following redirect"
        );

        attempt.follow()
    })
}

/// Build the shared HTTP client used for every NewsAPI request.
pub fn build_http_client() -> reqwest::Result<reqwest::Client> {
    // connection pooling and keepalive; every request goes to one host
    reqwest::Client::builder()
        .redirect(create_redirect_policy())
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(30))
        .tcp_keepalive(Duration::from_secs(60))
        .timeout(REQUEST_TIMEOUT)
        .user_agent(concat!("headlines/", env!("CARGO_PKG_VERSION")))
        .build()
}

// ============================================================================
// NewsAPI client
// ============================================================================

/// [`HeadlineFetcher`] backed by NewsAPI `v2/top-headlines`.
///
/// The API key travels in the `X-Api-Key` header rather than the query string so
/// it never shows up in URLs that end up in logs or error messages.
#[derive(Debug, Clone)]
pub struct NewsApiClient {
    http: reqwest::Client,
    endpoint: Url,
    api_key: SecretString,
    country: String,
}

impl NewsApiClient {
    /// Create a client for the API rooted at `base_url` (e.g. [`DEFAULT_BASE_URL`]).
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an absolute URL.
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        api_key: SecretString,
        country: impl Into<String>,
    ) -> Result<Self, url::ParseError> {
        // Trailing slash so join() appends instead of replacing the last segment
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base.join(TOP_HEADLINES_PATH)?;

        Ok(Self {
            http,
            endpoint,
            api_key,
            country: country.into(),
        })
    }

    fn request_url(&self, category: Category, page: u32, page_size: u32) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("country", &self.country)
            .append_pair("category", category.as_str())
            .append_pair("page", &page.to_string())
            .append_pair("pageSize", &page_size.to_string());
        url
    }
}

impl HeadlineFetcher for NewsApiClient {
    async fn fetch(
        &self,
        category: Category,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Article>, FetchError> {
        let url = self.request_url(category, page, page_size);
        tracing::debug!(category = %category, page, page_size, "Fetching headlines");

        let request = self
            .http
            .get(url)
            .header("X-Api-Key", self.api_key.expose_secret());

        let response = tokio::time::timeout(REQUEST_TIMEOUT, request.send())
            .await
            .map_err(|_| FetchError::Timeout)?
            .map_err(FetchError::Network)?;

        let status = response.status();
        let bytes = read_limited_bytes(response, MAX_RESPONSE_SIZE).await?;

        if !status.is_success() {
            // NewsAPI explains 4xx/5xx in a JSON body; fall back to the bare status
            return Err(match serde_json::from_slice::<NewsResponse>(&bytes) {
                Ok(body) if body.status == "error" => api_error(body),
                _ => FetchError::HttpStatus(status.as_u16()),
            });
        }

        let body: NewsResponse =
            serde_json::from_slice(&bytes).map_err(|e| FetchError::Parse(e.to_string()))?;

        if body.status != "ok" {
            return Err(api_error(body));
        }

        tracing::debug!(
            category = %category,
            page,
            received = body.articles.len(),
            total_results = body.total_results,
            "Headlines page received"
        );

        Ok(body.articles.into_iter().map(Article::sanitized).collect())
    }
}

fn api_error(body: NewsResponse) -> FetchError {
    let code = body.code.unwrap_or_else(|| "unknown".to_string());
    let message = body
        .message
        .map(|m| strip_control_chars(&m).into_owned())
        .unwrap_or_else(|| format!("NewsAPI returned status '{}'", body.status));
    FetchError::Api { code, message }
}

/// Compare in `u64`: a `usize` cast would wrap large lengths on 32-bit targets.
fn content_length_exceeds(len: u64, limit: usize) -> bool {
    u64::try_from(limit).is_ok_and(|limit| len > limit)
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if expected_length.is_some_and(|len| content_length_exceeds(len, limit)) {
        return Err(FetchError::ResponseTooLarge);
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    // Connection dropped mid-body
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
