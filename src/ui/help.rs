//! Help overlay listing the live key bindings, overrides included.

use crate::app::App;
use crate::keybindings::{Action, Context, KeybindingRegistry};
use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Clear, Row, Table},
    Frame,
};

const SECTIONS: [(Context, &str); 2] = [(Context::Global, "Headlines"), (Context::Help, "In this overlay")];

/// One line of the overlay: a section heading, or the keys bound to an action.
#[derive(Debug, Clone, PartialEq, Eq)]
enum HelpRow {
    Heading(&'static str),
    Binding { keys: String, description: &'static str },
    Gap,
}

/// Group bindings by section, folding every key bound to the same action into one row.
fn help_rows(registry: &KeybindingRegistry) -> Vec<HelpRow> {
    let bindings = registry.all_bindings();
    let mut rows = Vec::new();

    for (ctx, heading) in SECTIONS {
        let mut grouped: Vec<(Action, Vec<String>, &'static str)> = Vec::new();
        for (_, key, action, description) in bindings.iter().filter(|(c, ..)| *c == ctx) {
            match grouped.iter_mut().find(|(a, ..)| a == action) {
                Some((_, keys, _)) => keys.push(key.clone()),
                None => grouped.push((*action, vec![key.clone()], *description)),
            }
        }
        if grouped.is_empty() {
            continue;
        }

        if !rows.is_empty() {
            rows.push(HelpRow::Gap);
        }
        rows.push(HelpRow::Heading(heading));
        rows.extend(grouped.into_iter().map(|(_, keys, description)| HelpRow::Binding {
            keys: keys.join(" / "),
            description,
        }));
    }
    rows
}

fn overlay_area(area: Rect) -> Rect {
    let width = (area.width * 4 / 5).min(72);
    let height = area.height * 4 / 5;
    Rect::new(
        area.x + area.width.saturating_sub(width) / 2,
        area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    )
}

pub fn render<F, S>(f: &mut Frame, app: &App<F, S>) {
    let overlay = overlay_area(f.area());
    if overlay.width < 24 || overlay.height < 6 {
        return;
    }

    let rows = help_rows(&app.keybindings);
    // borders (2) + header with its margin (2)
    let visible = overlay.height.saturating_sub(4) as usize;
    let max_scroll = rows.len().saturating_sub(visible);
    let scroll = app.help_scroll_offset.min(max_scroll);

    let heading_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let table_rows = rows.into_iter().skip(scroll).take(visible).map(|row| match row {
        HelpRow::Heading(text) => Row::new(vec![Line::styled(text, heading_style), Line::from("")]),
        HelpRow::Binding { keys, description } => {
            Row::new(vec![Line::from(format!(" {keys}")), Line::from(description)])
        }
        HelpRow::Gap => Row::new(vec![Line::from(""), Line::from("")]),
    });

    let close = app
        .keybindings
        .key_hint(Action::ShowHelp)
        .unwrap_or_else(|| "Esc".to_string());
    let title = if max_scroll > 0 {
        format!(" Keys {}/{} ({close} closes) ", scroll + 1, max_scroll + 1)
    } else {
        format!(" Keys ({close} closes) ")
    };

    let table = Table::new(table_rows, [Constraint::Length(20), Constraint::Min(16)])
        .header(
            Row::new(vec!["Key", "Does"])
                .style(Style::default().add_modifier(Modifier::UNDERLINED))
                .bottom_margin(1),
        )
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(title),
        );

    f.render_widget(Clear, overlay);
    f.render_widget(table, overlay);
}
