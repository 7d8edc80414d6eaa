//! Input handling for the TUI.
//!
//! Keys are resolved to actions through the keybinding registry, using the
//! help context while the help overlay is open.

use crate::app::App;
use crate::keybindings::{Action as KbAction, Context as KbContext};
use crate::news::HeadlineFetcher;
use crate::storage::{FlagSet, FlagStore};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyModifiers};

use super::helpers::{spawn_refresh, spawn_select_category};
use super::Action;

/// Main input dispatch function.
pub(super) async fn handle_input<F, S>(
    app: &mut App<F, S>,
    code: KeyCode,
    modifiers: KeyModifiers,
) -> Result<Action>
where
    F: HeadlineFetcher + 'static,
    S: FlagStore,
{
    // Help overlay captures all keys when visible
    if app.show_help {
        return Ok(handle_help_input(app, code, modifiers));
    }

    let Some(action) = app
        .keybindings
        .action_for_key(code, modifiers, KbContext::Global)
    else {
        return Ok(Action::Continue);
    };

    match action {
        KbAction::Quit => return Ok(Action::Quit),
        KbAction::Back => {
            if app.favorites_only {
                app.toggle_favorites_only();
            } else {
                app.status_message = None;
            }
        }
        KbAction::NavDown => app.nav_down(),
        KbAction::NavUp => app.nav_up(),
        KbAction::PageDown => app.page_down(),
        KbAction::PageUp => app.page_up(),
        KbAction::Top => app.nav_top(),
        KbAction::Bottom => app.nav_bottom(),
        KbAction::NextCategory | KbAction::PrevCategory => {
            let category = app
                .cycle_category(action == KbAction::NextCategory)
                .await;
            spawn_select_category(app, category);
        }
        KbAction::Refresh => spawn_refresh(app),
        KbAction::Open => app.open_selected().await?,
        KbAction::ToggleFavorite => app.toggle_flag(FlagSet::Favorite).await?,
        KbAction::ToggleRead => app.toggle_flag(FlagSet::Read).await?,
        KbAction::ToggleFavoritesOnly => app.toggle_favorites_only(),
        KbAction::ShowHelp => app.open_help(),
    }

    Ok(Action::Continue)
}

/// Handle input while the help overlay is visible.
///
/// Nav keys scroll, `Back` dismisses, `Quit` still quits; everything else is
/// swallowed.
fn handle_help_input<F, S>(app: &mut App<F, S>, code: KeyCode, modifiers: KeyModifiers) -> Action {
    match app
        .keybindings
        .action_for_key(code, modifiers, KbContext::Help)
    {
        Some(KbAction::Quit) => return Action::Quit,
        Some(KbAction::Back) | Some(KbAction::ShowHelp) => app.close_help(),
        Some(KbAction::NavDown) => {
            app.help_scroll_offset = app.help_scroll_offset.saturating_add(1);
        }
        Some(KbAction::NavUp) => {
            app.help_scroll_offset = app.help_scroll_offset.saturating_sub(1);
        }
        _ => {}
    }
    Action::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{FeedState, HeadlinesController};
    use crate::keybindings::KeybindingRegistry;
    use crate::news::{Article, Category, FetchError};
    use crate::storage::MemoryFlagStore;
    use std::sync::Arc;

    struct NoopFetcher;

    impl HeadlineFetcher for NoopFetcher {
        async fn fetch(
            &self,
            _category: Category,
            _page: u32,
            _page_size: u32,
        ) -> Result<Vec<Article>, FetchError> {
            Ok(Vec::new())
        }
    }

    fn test_app() -> App<NoopFetcher, MemoryFlagStore> {
        let controller = Arc::new(HeadlinesController::new(NoopFetcher, Category::General, 20));
        let feed = controller.state();
        let mut app = App::new(
            controller,
            MemoryFlagStore::new(),
            KeybindingRegistry::new(),
            feed,
        );
        app.apply_state(FeedState {
            articles: Arc::new(
                (0..3)
                    .map(|i| Article {
                        url: format!("https://x/{i}"),
                        ..Default::default()
                    })
                    .collect(),
            ),
            ..app.controller.state()
        });
        app
    }

    async fn press(app: &mut App<NoopFetcher, MemoryFlagStore>, c: char) -> Action {
        handle_input(app, KeyCode::Char(c), KeyModifiers::NONE)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_quit_keys() {
        let mut app = test_app();
        assert!(matches!(press(&mut app, 'q').await, Action::Quit));
        let ctrl_c = handle_input(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL)
            .await
            .unwrap();
        assert!(matches!(ctrl_c, Action::Quit));
    }

    #[tokio::test]
    async fn test_help_overlay_captures_keys() {
        let mut app = test_app();
        press(&mut app, '?').await;
        assert!(app.show_help);

        press(&mut app, 'j').await;
        press(&mut app, 'j').await;
        assert_eq!(app.help_scroll_offset, 2);
        assert_eq!(app.selected, 0, "list does not move under the overlay");

        // q closes the overlay instead of quitting
        assert!(matches!(press(&mut app, 'q').await, Action::Continue));
        assert!(!app.show_help);
        assert_eq!(app.help_scroll_offset, 0);
    }

    #[tokio::test]
    async fn test_favorite_then_filter_then_back() {
        let mut app = test_app();
        press(&mut app, 'j').await;
        press(&mut app, 'f').await;
        assert!(app.favorites.contains("https://x/1"));

        press(&mut app, 'F').await;
        assert!(app.favorites_only);
        assert_eq!(app.visible_len(), 1);

        handle_input(&mut app, KeyCode::Esc, KeyModifiers::NONE)
            .await
            .unwrap();
        assert!(!app.favorites_only);
    }

    #[tokio::test]
    async fn test_unbound_key_is_ignored() {
        let mut app = test_app();
        assert!(matches!(press(&mut app, 'z').await, Action::Continue));
        assert_eq!(app.selected, 0);
    }
}
