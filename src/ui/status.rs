use crate::app::App;
use crate::keybindings::{Action as KbAction, KeybindingRegistry};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};
use std::borrow::Cow;

/// Hint line built from the live bindings so config overrides show up.
fn key_hints(keybindings: &KeybindingRegistry) -> String {
    [
        (KbAction::NextCategory, "category"),
        (KbAction::Refresh, "refresh"),
        (KbAction::Open, "open"),
        (KbAction::ToggleFavorite, "favorite"),
        (KbAction::ToggleFavoritesOnly, "favorites only"),
        (KbAction::ShowHelp, "help"),
        (KbAction::Quit, "quit"),
    ]
    .into_iter()
    .filter_map(|(action, label)| {
        keybindings
            .key_hint(action)
            .map(|key| format!("[{}] {}", key, label))
    })
    .collect::<Vec<_>>()
    .join(" ")
}

/// Render the status bar
pub fn render<F, S>(f: &mut Frame, app: &App<F, S>, area: Rect) {
    // Guard against zero-width/height areas
    if area.width < 1 || area.height < 1 {
        return;
    }

    let mut style = Style::default().bg(Color::DarkGray).fg(Color::White);

    let text: Cow<'_, str> = if let Some((msg, _)) = &app.status_message {
        Cow::Borrowed(msg.as_ref())
    } else if let Some(error) = &app.feed.error {
        // Articles are still on screen; the error view covers the empty case
        style = style.fg(Color::LightRed);
        let retry = app
            .keybindings
            .key_hint(KbAction::Refresh)
            .unwrap_or_else(|| "r".to_string());
        Cow::Owned(format!("{} | [{}] retry", error, retry))
    } else if app.feed.is_refreshing {
        Cow::Owned(format!("Loading {} headlines...", app.feed.category.label()))
    } else {
        Cow::Owned(key_hints(&app.keybindings))
    };

    let paragraph = Paragraph::new(text).style(style);
    f.render_widget(paragraph, area);
}
