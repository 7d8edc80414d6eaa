use crate::app::App;
use crate::util::{display_width, single_line, truncate_to_width};
use chrono::{DateTime, Utc};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

/// Format a publish time as relative time ("5m", "3h", "2d", "Mar 05").
pub fn format_relative_time(published: Option<DateTime<Utc>>) -> String {
    relative_time_at(published, Utc::now())
}

fn relative_time_at(published: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(ts) = published else {
        return String::new();
    };

    let diff = (now - ts).num_seconds();

    // Clock skew between the publisher and us
    if diff < 0 {
        return "now".to_string();
    }

    if diff < 3600 {
        return format!("{}m", diff / 60);
    }

    if diff < 86400 {
        return format!("{}h", diff / 3600);
    }

    if diff < 604800 {
        return format!("{}d", diff / 86400);
    }

    ts.format("%b %d").to_string()
}

/// Render the headline list panel
pub fn render<F, S>(f: &mut Frame, app: &App<F, S>, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }

    let visible = app.visible_articles();
    // Borders plus the star column
    let inner_width = area.width.saturating_sub(4) as usize;

    let mut items: Vec<ListItem> = if visible.is_empty() {
        let placeholder = if app.feed.is_refreshing {
            "Loading headlines..."
        } else if app.favorites_only {
            "No favorites in this list"
        } else {
            "No headlines"
        };
        vec![ListItem::new(Span::styled(
            placeholder,
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        visible
            .iter()
            .enumerate()
            .map(|(i, article)| {
                let mut spans = Vec::with_capacity(3);

                if app.is_favorite(article) {
                    spans.push(Span::styled("★ ", Style::default().fg(Color::Yellow)));
                } else {
                    spans.push(Span::raw("  "));
                }

                let title_style = if i == app.selected {
                    Style::default().bg(Color::DarkGray).fg(Color::White)
                } else if app.is_read(article) {
                    Style::default().fg(Color::Gray).add_modifier(Modifier::DIM)
                } else {
                    Style::default().add_modifier(Modifier::BOLD)
                };

                let time_str = format_relative_time(article.published());
                let meta = match (article.source.name.is_empty(), time_str.is_empty()) {
                    (false, false) => format!("  {} · {}", article.source.name, time_str),
                    (false, true) => format!("  {}", article.source.name),
                    (true, false) => format!("  {}", time_str),
                    (true, true) => String::new(),
                };

                // Title gets whatever the metadata leaves over
                let meta_width = display_width(&meta).min(inner_width / 2);
                let meta = truncate_to_width(&meta, meta_width).into_owned();
                let title = single_line(&article.title);
                let title = truncate_to_width(&title, inner_width.saturating_sub(meta_width));

                spans.push(Span::styled(title.into_owned(), title_style));
                if !meta.is_empty() {
                    spans.push(Span::styled(meta, Style::default().fg(Color::DarkGray)));
                }

                ListItem::new(Line::from(spans))
            })
            .collect()
    };

    if !visible.is_empty() && !app.favorites_only {
        if app.feed.is_loading_more {
            items.push(ListItem::new(Span::styled(
                "  Loading more...",
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            )));
        } else if app.feed.end_of_data {
            items.push(ListItem::new(Span::styled(
                "  No more headlines",
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    let mut title = format!("{} ({})", app.feed.category.label(), visible.len());
    if app.favorites_only {
        title.push_str(" - favorites");
    }
    if app.feed.is_refreshing && !visible.is_empty() {
        title.push_str(" - refreshing");
    }

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(title),
        )
        .highlight_style(Style::default());

    let selected = (!visible.is_empty()).then_some(app.selected);
    let mut state = ListState::default().with_selected(selected);
    f.render_stateful_widget(list, area, &mut state);
}
