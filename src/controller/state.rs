use crate::news::{Article, Category};
use std::sync::Arc;

/// Snapshot of everything the presentation layer renders.
///
/// Cloning is cheap: the article list is shared behind an `Arc` and only copied
/// when a load-more appends to a list that a subscriber still holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedState {
    pub category: Category,
    pub articles: Arc<Vec<Article>>,
    /// Last page requested in this session (1-based).
    pub current_page: u32,
    /// A page shorter than the page size was received; nothing left to load.
    pub end_of_data: bool,
    pub is_refreshing: bool,
    pub is_loading_more: bool,
    /// Message from the last failed refresh. Load-more failures never set this.
    pub error: Option<String>,
    /// Bumped by every refresh; completions from older sessions are discarded.
    pub(crate) session: u64,
}

impl FeedState {
    pub(crate) fn new(category: Category) -> Self {
        Self {
            category,
            current_page: 1,
            ..Default::default()
        }
    }

    /// True while any request for this category is in flight.
    pub fn is_busy(&self) -> bool {
        self.is_refreshing || self.is_loading_more
    }
}
