//! NewsAPI headlines: wire types, the [`HeadlineFetcher`] seam and its HTTP
//! implementation.

mod client;
mod fetcher;
mod types;

pub use client::{build_http_client, NewsApiClient, DEFAULT_BASE_URL};
pub use fetcher::{FetchError, HeadlineFetcher};
pub use types::{Article, Category, NewsResponse, ParseCategoryError, Source};
