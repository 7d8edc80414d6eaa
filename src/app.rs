use crate::controller::{FeedState, HeadlinesController};
use crate::keybindings::KeybindingRegistry;
use crate::news::{Article, Category, HeadlineFetcher};
use crate::storage::{Database, FlagSet, FlagStore, SESSION_CATEGORY_KEY};
use crate::util::{validate_url_for_open, UrlValidationError};
use anyhow::{Context as _, Result};
use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::time::Instant;

/// Rows from the end of the list at which the next page is requested.
pub const LOAD_MORE_THRESHOLD: usize = 5;

/// Rows moved by page up/down.
pub const PAGE_STEP: usize = 10;

/// How long a status-bar message stays up.
const STATUS_TTL_SECS: u64 = 3;

/// True when the selection is close enough to the end of a non-empty list
/// that the next page should be fetched.
pub fn should_load_more(selected: usize, len: usize) -> bool {
    len > 0 && selected + LOAD_MORE_THRESHOLD >= len
}

/// Presentation state for the TUI.
///
/// The controller's [`FeedState`] is mirrored into `feed` by the event loop;
/// everything else here (selection, filters, overlays, local copies of the flag
/// sets) is owned by the UI.
pub struct App<F, S> {
    pub controller: Arc<HeadlinesController<F>>,
    store: S,
    /// `None` for ephemeral sessions; the category is then not remembered.
    preferences: Option<Database>,

    pub feed: FeedState,
    /// Category of the most recent switch intent. Can run ahead of
    /// `feed.category` until the spawned switch has taken the state lock.
    category_intent: Category,

    pub read: HashSet<String>,
    pub favorites: HashSet<String>,

    /// Index into the displayed (possibly filtered) list.
    pub selected: usize,
    pub favorites_only: bool,

    pub show_help: bool,
    pub help_scroll_offset: usize,

    pub status_message: Option<(Cow<'static, str>, Instant)>,
    pub keybindings: KeybindingRegistry,
    pub mark_read_on_open: bool,

    /// set whenever something visible changed; cleared after a draw.
    pub needs_redraw: bool,
    /// (selected, displayed length) the load-more trigger last looked at.
    last_trigger: Option<(usize, usize)>,
}

impl<F, S> App<F, S> {
    pub fn new(
        controller: Arc<HeadlinesController<F>>,
        store: S,
        keybindings: KeybindingRegistry,
        feed: FeedState,
    ) -> Self {
        Self {
            controller,
            store,
            preferences: None,
            category_intent: feed.category,
            feed,
            read: HashSet::new(),
            favorites: HashSet::new(),
            selected: 0,
            favorites_only: false,
            show_help: false,
            help_scroll_offset: 0,
            status_message: None,
            keybindings,
            mark_read_on_open: true,
            needs_redraw: true,
            last_trigger: None,
        }
    }

    /// Remember the selected category in `db` across restarts.
    pub fn with_preferences(mut self, db: Database) -> Self {
        self.preferences = Some(db);
        self
    }

    /// Mirror a new controller snapshot.
    ///
    /// The selection goes back to the top when the category changed or a
    /// refresh just finished successfully, since the list was replaced.
    pub fn apply_state(&mut self, state: FeedState) {
        let category_changed = state.category != self.feed.category;
        let refreshed =
            self.feed.is_refreshing && !state.is_refreshing && state.error.is_none();

        if category_changed || refreshed {
            self.selected = 0;
            self.last_trigger = None;
        }

        self.feed = state;
        self.clamp_selection();
        self.needs_redraw = true;
    }

    /// Articles in display order, after the favorites-only filter.
    pub fn visible_articles(&self) -> Vec<&Article> {
        self.feed
            .articles
            .iter()
            .filter(|a| !self.favorites_only || self.favorites.contains(&a.url))
            .collect()
    }

    pub fn visible_len(&self) -> usize {
        if self.favorites_only {
            self.visible_articles().len()
        } else {
            self.feed.articles.len()
        }
    }

    pub fn selected_article(&self) -> Option<&Article> {
        self.visible_articles().get(self.selected).copied()
    }

    pub fn is_read(&self, article: &Article) -> bool {
        self.read.contains(&article.url)
    }

    pub fn is_favorite(&self, article: &Article) -> bool {
        self.favorites.contains(&article.url)
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    pub fn nav_down(&mut self) {
        let len = self.visible_len();
        if len > 0 {
            self.selected = self.selected.saturating_add(1).min(len - 1);
        }
    }

    pub fn nav_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn page_down(&mut self) {
        let len = self.visible_len();
        if len > 0 {
            self.selected = self.selected.saturating_add(PAGE_STEP).min(len - 1);
        }
    }

    pub fn page_up(&mut self) {
        self.selected = self.selected.saturating_sub(PAGE_STEP);
    }

    pub fn nav_top(&mut self) {
        self.selected = 0;
    }

    pub fn nav_bottom(&mut self) {
        self.selected = self.visible_len().saturating_sub(1);
    }

    /// Whether the list position calls for the next page.
    ///
    /// Only evaluated when the selection or the displayed length changed since
    /// the last call, so sitting at the bottom does not re-request forever. The
    /// favorites-only view never pages: its length says nothing about how much
    /// of the category has been loaded.
    pub fn take_load_more_trigger(&mut self) -> bool {
        if self.favorites_only {
            return false;
        }
        let key = (self.selected, self.feed.articles.len());
        if self.last_trigger == Some(key) {
            return false;
        }
        self.last_trigger = Some(key);
        should_load_more(key.0, key.1)
    }

    pub fn toggle_favorites_only(&mut self) {
        self.favorites_only = !self.favorites_only;
        self.selected = 0;
        self.last_trigger = None;
        self.set_status(if self.favorites_only {
            "Showing favorites only"
        } else {
            "Showing all headlines"
        });
    }

    pub fn open_help(&mut self) {
        self.show_help = true;
        self.help_scroll_offset = 0;
    }

    pub fn close_help(&mut self) {
        self.show_help = false;
        self.help_scroll_offset = 0;
    }

    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    /// Clear the status message once it is older than three seconds.
    /// Returns true if a message was actually cleared.
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed().as_secs() >= STATUS_TTL_SECS {
                self.status_message = None;
                return true;
            }
        }
        false
    }
}

impl<F: HeadlineFetcher, S: FlagStore> App<F, S> {
    /// Load both flag sets into memory.
    pub async fn load_flags(&mut self) -> Result<()> {
        let read = self
            .store
            .members(FlagSet::Read)
            .await
            .context("Failed to load read articles")?;
        let favorites = self
            .store
            .members(FlagSet::Favorite)
            .await
            .context("Failed to load favorites")?;

        tracing::debug!(read = read.len(), favorites = favorites.len(), "Loaded flags");
        self.read = read.into_iter().collect();
        self.favorites = favorites.into_iter().collect();
        Ok(())
    }

    /// Flip `set` membership of the selected article.
    ///
    /// The store write completes before the local set changes, so what is on
    /// screen is always what is on disk.
    pub async fn toggle_flag(&mut self, set: FlagSet) -> Result<()> {
        let Some(url) = self.selected_article().map(|a| a.url.clone()) else {
            return Ok(());
        };
        if url.is_empty() {
            self.set_status(UrlValidationError::Empty.to_string());
            return Ok(());
        }

        let now_member = self
            .store
            .toggle(set, &url)
            .await
            .with_context(|| format!("Failed to update {set} flag"))?;

        let local = match set {
            FlagSet::Read => &mut self.read,
            FlagSet::Favorite => &mut self.favorites,
        };
        if now_member {
            local.insert(url);
        } else {
            local.remove(&url);
        }

        self.set_status(match (set, now_member) {
            (FlagSet::Favorite, true) => "Added to favorites",
            (FlagSet::Favorite, false) => "Removed from favorites",
            (FlagSet::Read, true) => "Marked as read",
            (FlagSet::Read, false) => "Marked as unread",
        });
        self.clamp_selection();
        Ok(())
    }

    /// Open the selected article in the system browser.
    ///
    /// SEC: the URL is validated before `open::that`. The article is marked
    /// read first when `mark_read_on_open` is set.
    pub async fn open_selected(&mut self) -> Result<()> {
        let Some(url) = self.selected_article().map(|a| a.url.clone()) else {
            return Ok(());
        };

        let validated = match validate_url_for_open(&url) {
            Ok(u) => u,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Refusing to open article URL");
                self.set_status(e.to_string());
                return Ok(());
            }
        };

        if self.mark_read_on_open && !self.read.contains(&url) {
            self.store
                .add(FlagSet::Read, &url)
                .await
                .context("Failed to mark article as read")?;
            self.read.insert(url);
        }

        if let Err(e) = open::that(validated.as_str()) {
            self.set_status(format!("Failed to open browser: {}", e));
        }
        Ok(())
    }

    /// Step to the next or previous category and remember it.
    ///
    /// Returns the category the controller should switch to.
    pub async fn cycle_category(&mut self, forward: bool) -> Category {
        let target = if forward {
            self.category_intent.next()
        } else {
            self.category_intent.prev()
        };
        self.category_intent = target;
        self.selected = 0;
        self.last_trigger = None;
        self.persist_category(target).await;
        target
    }

    async fn persist_category(&self, category: Category) {
        let Some(db) = &self.preferences else {
            return;
        };
        if let Err(e) = db
            .set_preference(SESSION_CATEGORY_KEY, category.as_str())
            .await
        {
            tracing::warn!(category = %category, error = %e, "Failed to save selected category");
        }
    }
}
