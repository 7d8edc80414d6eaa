//! Render functions for the TUI.
//!
//! Layout, top to bottom: category chips, the headline list beside the
//! preview pane (or the error view), and the status bar.

use crate::app::App;
use crate::keybindings::Action as KbAction;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::{articles, categories, help, preview, status};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 60;
pub(super) const MIN_HEIGHT: u16 = 10;

/// Main render dispatch function.
///
/// Handles terminal size validation before rendering.
pub(super) fn render<F, S>(f: &mut Frame, app: &App<F, S>) {
    let area = f.area();

    // Guard against zero-width/height to prevent panics
    if area.width < 1 || area.height < 1 {
        return;
    }

    // Minimum terminal size check for usable UI
    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    categories::render(f, app, chunks[0]);
    if shows_error_view(app) {
        render_error(f, app, chunks[1]);
    } else {
        render_main_panels(f, app, chunks[1]);
    }
    status::render(f, app, chunks[2]);

    if app.show_help {
        help::render(f, app);
    }
}

/// A failed refresh with nothing to show takes over the main area; with
/// articles on screen the error goes to the status bar instead.
fn shows_error_view<F, S>(app: &App<F, S>) -> bool {
    app.feed.error.is_some() && app.feed.articles.is_empty() && !app.feed.is_refreshing
}

/// Headline list (55%) | preview (45%).
fn render_main_panels<F, S>(f: &mut Frame, app: &App<F, S>, area: Rect) {
    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    articles::render(f, app, main_chunks[0]);
    preview::render(f, app, main_chunks[1]);
}

fn render_error<F, S>(f: &mut Frame, app: &App<F, S>, area: Rect) {
    let message = app.feed.error.as_deref().unwrap_or_default();
    let retry_key = app
        .keybindings
        .key_hint(KbAction::Refresh)
        .unwrap_or_else(|| "r".to_string());

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::raw("Press "),
            Span::styled(retry_key, Style::default().fg(Color::Cyan)),
            Span::raw(" to retry"),
        ]),
    ];

    let paragraph = Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .title(format!(" {} ", app.feed.category.label())),
        );
    f.render_widget(paragraph, area);
}
