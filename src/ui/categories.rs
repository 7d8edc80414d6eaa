use crate::app::App;
use crate::news::Category;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// One chip per category, the selected one highlighted.
fn chips(selected: Category) -> Line<'static> {
    let mut spans = Vec::with_capacity(Category::ALL.len() * 2);
    for (i, category) in Category::ALL.into_iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" "));
        }
        let style = if category == selected {
            Style::default()
                .bg(Color::Cyan)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(format!(" {} ", category.label()), style));
    }
    Line::from(spans)
}

/// Render the category chip bar.
pub fn render<F, S>(f: &mut Frame, app: &App<F, S>, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }

    let bar = Paragraph::new(chips(app.feed.category)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Top headlines "),
    );
    f.render_widget(bar, area);
}
