use thiserror::Error;
use url::Url;

/// Reasons an article link is refused before it reaches the system browser.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The article has no link at all.
    #[error("Article has no URL")]
    Empty,
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// http(s) URL without a host, e.g. `https:///path`.
    #[error("URL has no host")]
    MissingHost,
    /// Raw whitespace or control characters that a shell or opener could split on.
    #[error("URL contains control characters or whitespace")]
    ControlCharacters,
}

/// Validates an article URL before handing it to `open::that`.
///
/// SEC: article links come from a third-party API. Only absolute http(s) URLs
/// with a host are opened; `file://`, `javascript:` and friends are refused, as
/// is anything with embedded whitespace or control characters.
///
/// # Examples
///
/// ```
/// use headlines::util::validate_url_for_open;
///
/// assert!(validate_url_for_open("https://example.com/story").is_ok());
/// assert!(validate_url_for_open("file:///etc/passwd").is_err());
/// assert!(validate_url_for_open("").is_err());
/// ```
pub fn validate_url_for_open(url_str: &str) -> Result<Url, UrlValidationError> {
    if url_str.trim().is_empty() {
        return Err(UrlValidationError::Empty);
    }

    // Url::parse silently strips tabs/newlines, so check the raw string first
    if url_str
        .chars()
        .any(|c| c.is_control() || c.is_whitespace())
    {
        return Err(UrlValidationError::ControlCharacters);
    }

    let url = Url::parse(url_str)?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(UrlValidationError::MissingHost),
    }
}
