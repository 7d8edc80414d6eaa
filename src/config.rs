//! Configuration file parser for ~/.config/headlines/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are ignored by serde, though we log a warning when the file
//! contains potential typos. Command-line flags override file values; the
//! `NEWSAPI_KEY` environment variable overrides `api_key`.
use crate::controller::DEFAULT_PAGE_SIZE;
use crate::news::{Category, DEFAULT_BASE_URL};
use secrecy::SecretString;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Environment variable that supplies the NewsAPI key.
pub const API_KEY_ENV: &str = "NEWSAPI_KEY";

/// NewsAPI rejects `pageSize` above this.
pub const MAX_PAGE_SIZE: u32 = 100;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    /// A key parsed but its value is out of range.
    #[error("Invalid value for '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
///
/// Custom Debug impl masks `api_key` to prevent secret leakage
/// in logs, error messages, and debug output.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// NewsAPI key. `NEWSAPI_KEY` takes precedence.
    pub api_key: Option<String>,

    /// API root, without the `/v2/...` path.
    pub base_url: String,

    /// Two-letter ISO 3166 country code sent with every request.
    pub country: String,

    /// Articles per page (1..=100).
    pub page_size: u32,

    /// Category shown on first launch, before any category has been remembered.
    pub default_category: Category,

    /// Whether opening an article in the browser marks it read.
    pub mark_read_on_open: bool,

    /// Custom keybinding overrides. Keys are action names, values are key strings.
    pub keybindings: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            country: "us".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            default_category: Category::General,
            mark_read_on_open: true,
            keybindings: HashMap::new(),
        }
    }
}

/// Mask api_key in Debug output to prevent secret leakage.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("country", &self.country)
            .field("page_size", &self.page_size)
            .field("default_category", &self.default_category)
            .field("mark_read_on_open", &self.mark_read_on_open)
            .field("keybindings", &self.keybindings)
            .finish()
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 7] = [
        "api_key",
        "base_url",
        "country",
        "page_size",
        "default_category",
        "mark_read_on_open",
        "keybindings",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Out-of-range values → `Err(ConfigError::Invalid)`
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // Check file size before reading
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // File deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        Self::parse(&content)
    }

    /// Parse and validate config file contents.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            tracing::debug!("Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        config.validate()?;
        tracing::info!(
            country = %config.country,
            page_size = config.page_size,
            default_category = %config.default_category,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Check value ranges that serde can't express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_page_size(self.page_size)?;

        if self.country.len() != 2 || !self.country.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ConfigError::Invalid {
                key: "country",
                reason: format!("'{}' is not a two-letter country code", self.country),
            });
        }

        match url::Url::parse(&self.base_url) {
            Ok(u) if u.scheme() == "http" || u.scheme() == "https" => {}
            Ok(u) => {
                return Err(ConfigError::Invalid {
                    key: "base_url",
                    reason: format!("unsupported scheme '{}'", u.scheme()),
                })
            }
            Err(e) => {
                return Err(ConfigError::Invalid {
                    key: "base_url",
                    reason: e.to_string(),
                })
            }
        }

        Ok(())
    }

    /// NewsAPI key: `NEWSAPI_KEY` if set and non-empty, else the file's `api_key`.
    pub fn resolve_api_key(&self) -> Option<SecretString> {
        pick_api_key(std::env::var(API_KEY_ENV).ok(), self.api_key.clone())
    }
}

/// Range check shared by the config file and `--page-size`.
pub fn validate_page_size(page_size: u32) -> Result<(), ConfigError> {
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(ConfigError::Invalid {
            key: "page_size",
            reason: format!("{} is outside 1..={}", page_size, MAX_PAGE_SIZE),
        });
    }
    Ok(())
}

fn pick_api_key(env: Option<String>, file: Option<String>) -> Option<SecretString> {
    [env, file]
        .into_iter()
        .flatten()
        .map(|k| k.trim().to_string())
        .find(|k| !k.is_empty())
        .map(SecretString::from)
}

// ============================================================================
// Tests
// ============================================================================
