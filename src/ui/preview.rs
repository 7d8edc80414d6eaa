//! Preview pane for the selected headline.

use crate::app::App;
use crate::news::Article;
use crate::util::strip_content_marker;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

/// Build the preview text: title, byline, source and date, description,
/// then the content snippet when it adds anything.
fn preview_lines(article: &Article, favorite: bool) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    let mut title = Vec::with_capacity(2);
    if favorite {
        title.push(Span::styled("★ ", Style::default().fg(Color::Yellow)));
    }
    title.push(Span::styled(
        article.title.clone(),
        Style::default().add_modifier(Modifier::BOLD),
    ));
    lines.push(Line::from(title));
    lines.push(Line::from(""));

    let meta = Style::default().fg(Color::DarkGray);
    if let Some(author) = article.author.as_deref().filter(|a| !a.trim().is_empty()) {
        lines.push(Line::from(Span::styled(format!("By {}", author), meta)));
    }

    let date = article.published_date();
    let source_line = match (article.source.name.is_empty(), date.is_empty()) {
        (false, false) => format!("{} · {}", article.source.name, date),
        (false, true) => article.source.name.clone(),
        (true, false) => date,
        (true, true) => String::new(),
    };
    if !source_line.is_empty() {
        lines.push(Line::from(Span::styled(source_line, meta)));
    }

    let description = article
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());
    if let Some(description) = description {
        lines.push(Line::from(""));
        lines.push(Line::from(description.to_string()));
    }

    // NewsAPI truncates content and often repeats the description verbatim
    let content = article
        .content
        .as_deref()
        .map(strip_content_marker)
        .filter(|c| !c.is_empty() && Some(*c) != description);
    if let Some(content) = content {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            content.to_string(),
            Style::default().fg(Color::Gray),
        )));
    }

    if !article.url.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            article.url.clone(),
            Style::default().fg(Color::Blue),
        )));
    }

    lines
}

pub fn render<F, S>(f: &mut Frame, app: &App<F, S>, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }

    let block = Block::default().borders(Borders::ALL).title("Preview");

    let paragraph = match app.selected_article() {
        Some(article) => Paragraph::new(preview_lines(article, app.is_favorite(article)))
            .wrap(Wrap { trim: false }),
        None => Paragraph::new(Span::styled(
            "No article selected",
            Style::default().fg(Color::DarkGray),
        )),
    };

    f.render_widget(paragraph.block(block), area);
}
