use crate::util::strip_control_chars;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Category
// ============================================================================

/// NewsAPI top-headlines category.
///
/// Exactly one category is selected at a time. The wire tag (`as_str`) is what
/// NewsAPI expects in the `category` query parameter and what the config file and
/// the `--category` flag accept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    General,
    Business,
    Entertainment,
    Health,
    Science,
    Sports,
    Technology,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Category; 7] = [
        Category::General,
        Category::Business,
        Category::Entertainment,
        Category::Health,
        Category::Science,
        Category::Sports,
        Category::Technology,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::General => "general",
            Category::Business => "business",
            Category::Entertainment => "entertainment",
            Category::Health => "health",
            Category::Science => "science",
            Category::Sports => "sports",
            Category::Technology => "technology",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::General => "General",
            Category::Business => "Business",
            Category::Entertainment => "Entertainment",
            Category::Health => "Health",
            Category::Science => "Science",
            Category::Sports => "Sports",
            Category::Technology => "Technology",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|c| *c == self).unwrap_or(0)
    }

    /// Next category in display order, wrapping around.
    pub fn next(self) -> Category {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// Previous category in display order, wrapping around.
    pub fn prev(self) -> Category {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown category '{0}' (expected one of: general, business, entertainment, health, science, sports, technology)")]
pub struct ParseCategoryError(pub String);

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(tag))
            .ok_or_else(|| ParseCategoryError(tag.to_string()))
    }
}

// ============================================================================
// Wire types
// ============================================================================

/// Publisher of an article. `id` is null for many smaller outlets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
}

/// A single headline as returned by NewsAPI.
///
/// Identified by `url`; the read and favorite flags are keyed on it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(default)]
    pub source: Source,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,
    #[serde(default, rename = "urlToImage")]
    pub image_url: Option<String>,
    /// ISO-8601 timestamp string, kept verbatim.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub published_at: String,
    #[serde(default)]
    pub content: Option<String>,
}

impl Article {
    /// Parsed publish time, `None` when the timestamp is missing or malformed.
    pub fn published(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.published_at)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Publish date as `MM/DD/YYYY`, or an empty string if it can't be parsed.
    pub fn published_date(&self) -> String {
        self.published()
            .map(|dt| dt.format("%m/%d/%Y").to_string())
            .unwrap_or_default()
    }

    /// Strip terminal control sequences from every displayed text field.
    ///
    /// The URL is left untouched: it's the flag key and is validated separately
    /// before being handed to the browser.
    pub fn sanitized(mut self) -> Self {
        fn clean(s: &mut String) {
            if let std::borrow::Cow::Owned(cleaned) = strip_control_chars(s) {
                *s = cleaned;
            }
        }
        fn clean_opt(s: &mut Option<String>) {
            if let Some(s) = s.as_mut() {
                clean(s);
            }
        }

        clean(&mut self.title);
        clean(&mut self.source.name);
        clean_opt(&mut self.author);
        clean_opt(&mut self.description);
        clean_opt(&mut self.content);
        self
    }
}

/// Envelope for every `v2/top-headlines` response, success or error.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsResponse {
    pub status: String,
    #[serde(default)]
    pub total_results: u64,
    #[serde(default)]
    pub articles: Vec<Article>,
    /// Error code such as `apiKeyInvalid`, present when `status == "error"`.
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
