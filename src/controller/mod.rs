//! Pagination and category state for the headline list.
//!
//! [`HeadlinesController`] owns the selected category, the page cursor, the
//! end-of-data flag, the in-flight flags, the accumulated articles and the last
//! refresh error. All of it lives in a single [`FeedState`] inside a
//! `tokio::sync::watch` channel:
//!
//! - every mutation runs inside the channel's write lock (`send_if_modified`),
//!   so mutations are atomic and totally ordered;
//! - subscribers are notified only when something actually changed;
//! - no lock is held across a fetch.
//!
//! Each fetch carries the `(session, category, page)` it was issued for. When
//! it completes, the result is applied only if the state still has that
//! session, category and page; anything else is a stale completion and is
//! dropped. A refresh starts a new session, which orphans in-flight load-mores.
//!
//! Refreshes and category switches can be split in two: `begin_*` publishes
//! the new session right away, and [`HeadlinesController::complete_refresh`]
//! does the fetch later, possibly on another task.

mod state;

pub use state::FeedState;

use crate::news::{Category, HeadlineFetcher};
use std::sync::Arc;
use tokio::sync::watch;

/// Articles requested per page.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Parameters a fetch was issued for; used to recognise stale completions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Request {
    session: u64,
    category: Category,
    page: u32,
}

impl Request {
    fn matches(&self, st: &FeedState) -> bool {
        st.session == self.session && st.category == self.category && st.current_page == self.page
    }
}

/// A refresh whose state change is already published but whose fetch has not
/// run yet. Finish it with [`HeadlinesController::complete_refresh`].
///
/// Splitting the two lets callers apply intents in the order they arrive and
/// run the network part on another task.
#[derive(Debug, Default)]
#[must_use = "the refresh does nothing until it is completed"]
pub struct PendingRefresh {
    request: Request,
    // Cursor of the list the refresh was meant to replace
    previous_page: u32,
    previous_end_of_data: bool,
    category_changed: bool,
}

impl PendingRefresh {
    pub fn category(&self) -> Category {
        self.request.category
    }
}

/// Reset the cursor for a fresh first page and start a new session.
fn start_refresh(st: &mut FeedState, category_changed: bool) -> PendingRefresh {
    let previous_page = st.current_page;
    let previous_end_of_data = st.end_of_data;

    st.session = st.session.wrapping_add(1);
    st.current_page = 1;
    st.end_of_data = false;
    st.is_refreshing = true;
    st.is_loading_more = false;
    st.error = None;
    PendingRefresh {
        request: Request {
            session: st.session,
            category: st.category,
            page: 1,
        },
        previous_page,
        previous_end_of_data,
        category_changed,
    }
}

pub struct HeadlinesController<F> {
    fetcher: F,
    page_size: u32,
    state: watch::Sender<FeedState>,
}

impl<F: HeadlineFetcher> HeadlinesController<F> {
    /// Create a controller with an empty list for `category`.
    ///
    /// Nothing is fetched until [`refresh`](Self::refresh) is called. A
    /// `page_size` of zero is treated as one.
    pub fn new(fetcher: F, category: Category, page_size: u32) -> Self {
        let (state, _) = watch::channel(FeedState::new(category));
        Self {
            fetcher,
            page_size: page_size.max(1),
            state,
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Receiver that is notified after every state mutation.
    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.state.subscribe()
    }

    /// Current snapshot.
    pub fn state(&self) -> FeedState {
        self.state.borrow().clone()
    }

    /// Apply `f` under the state lock; subscribers are notified iff it returns `Some`.
    fn update<T>(&self, f: impl FnOnce(&mut FeedState) -> Option<T>) -> Option<T> {
        let mut out = None;
        self.state.send_if_modified(|st| {
            out = f(st);
            out.is_some()
        });
        out
    }

    /// Switch to `category` and reload from page 1. No-op if already selected.
    pub async fn select_category(&self, category: Category) {
        if let Some(pending) = self.begin_select_category(category) {
            self.complete_refresh(pending).await;
        }
    }

    /// Publish the switch to `category` without fetching.
    ///
    /// Returns `None` if `category` is already selected.
    pub fn begin_select_category(&self, category: Category) -> Option<PendingRefresh> {
        let pending = self.update(|st| {
            if st.category == category {
                return None;
            }
            st.category = category;
            Some(start_refresh(st, true))
        });
        match pending {
            Some(_) => tracing::info!(category = %category, "Category selected"),
            None => tracing::debug!(category = %category, "Category already selected"),
        }
        pending
    }

    /// Reload the selected category from page 1.
    ///
    /// Used for the initial load and for retry. If refreshes overlap, the most
    /// recent one wins. On failure the existing articles are kept and `error`
    /// is set.
    pub async fn refresh(&self) {
        let pending = self.begin_refresh();
        self.complete_refresh(pending).await;
    }

    /// Publish the start of a refresh session without fetching.
    pub fn begin_refresh(&self) -> PendingRefresh {
        let mut pending = PendingRefresh::default();
        self.state.send_modify(|st| pending = start_refresh(st, false));
        pending
    }

    /// Fetch page 1 for `pending` and apply it, unless a newer session or
    /// category has taken over in the meantime.
    ///
    /// A failure keeps the articles. The cursor goes back to where it was so
    /// a later load-more continues the list on screen; after a failed category
    /// switch the list belongs to another category, so it is marked complete
    /// until a refresh succeeds.
    pub async fn complete_refresh(&self, pending: PendingRefresh) {
        let request = pending.request;
        let result = self
            .fetcher
            .fetch(request.category, request.page, self.page_size)
            .await;

        let outcome = result.map_err(|e| {
            tracing::warn!(category = %request.category, error = %e, "Refresh failed");
            format!("Failed to load headlines: {e}")
        });

        let page_size = self.page_size as usize;
        let applied = self.update(|st| {
            if !request.matches(st) {
                return None;
            }
            st.is_refreshing = false;
            match outcome {
                Ok(articles) => {
                    st.end_of_data = articles.len() < page_size;
                    st.articles = Arc::new(articles);
                }
                Err(message) => {
                    st.error = Some(message);
                    if pending.category_changed || st.articles.is_empty() {
                        st.end_of_data = true;
                    } else {
                        st.current_page = pending.previous_page;
                        st.end_of_data = pending.previous_end_of_data;
                    }
                }
            }
            Some(())
        });

        if applied.is_none() {
            tracing::debug!(
                category = %request.category,
                session = request.session,
                "Discarding stale refresh result"
            );
        }
    }

    /// Fetch the next page and append it.
    ///
    /// No-op while a load-more or a refresh is in flight, or once the end of
    /// data has been reached. Failures are logged and otherwise ignored; the page
    /// cursor stays advanced so the next call asks for the following page.
    pub async fn load_more(&self) {
        let request = self.update(|st| {
            if st.is_loading_more || st.end_of_data || st.is_refreshing {
                return None;
            }
            st.is_loading_more = true;
            st.current_page += 1;
            Some(Request {
                session: st.session,
                category: st.category,
                page: st.current_page,
            })
        });
        let Some(request) = request else {
            return;
        };

        let result = self
            .fetcher
            .fetch(request.category, request.page, self.page_size)
            .await;

        if let Err(e) = &result {
            tracing::warn!(
                category = %request.category,
                page = request.page,
                error = %e,
                "Load more failed"
            );
        }

        let page_size = self.page_size as usize;
        let applied = self.update(|st| {
            if !request.matches(st) {
                return None;
            }
            st.is_loading_more = false;
            if let Ok(articles) = result {
                if articles.len() < page_size {
                    st.end_of_data = true;
                }
                Arc::make_mut(&mut st.articles).extend(articles);
            }
            Some(())
        });

        if applied.is_none() {
            tracing::debug!(
                category = %request.category,
                page = request.page,
                "Discarding stale load-more result"
            );
        }
    }
}
