//! Field rendering utilities for forms

use crate::state::validation::PasswordStrength;
use crate::state::{FormField, OptionSource, SelectionLink};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Width of the password strength bar in cells
const STRENGTH_BAR_WIDTH: usize = 8;

fn border_style(is_active: bool, has_error: bool) -> Style {
    if has_error {
        Style::default().fg(Color::Red)
    } else if is_active {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn field_title(label: &str, required: bool) -> String {
    if required {
        format!(" {label} * ")
    } else {
        format!(" {label} ")
    }
}

/// Block around a row; the error, when present, sits in the bottom border
fn row_block<'a>(title: String, is_active: bool, error: Option<&'a str>) -> Block<'a> {
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style(is_active, error.is_some()));
    match error {
        Some(message) => block.title_bottom(Line::from(Span::styled(
            format!(" {message} "),
            Style::default().fg(Color::Red),
        ))),
        None => block,
    }
}

/// Draw a text, secret or toggle field
pub fn draw_field(
    frame: &mut Frame,
    area: Rect,
    field: &FormField,
    is_active: bool,
    error: Option<&str>,
) {
    let style = if is_active {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::White)
    };

    let display_value = field.display_value();
    let mut spans = if display_value.is_empty() {
        let hint = match field.placeholder {
            Some(placeholder) => placeholder,
            None if is_active => "",
            None => "(empty)",
        };
        vec![Span::styled(hint, Style::default().fg(Color::DarkGray))]
    } else {
        vec![Span::styled(display_value, style)]
    };
    if is_active && !field.is_toggle() {
        spans.push(Span::styled("▌", Style::default().fg(Color::Cyan)));
    }

    let mut block = row_block(field_title(&field.label, field.required), is_active, error);
    if error.is_none() && field.name == "password" {
        if let Some(meter) = strength_meter(field.as_text()) {
            block = block.title_bottom(meter);
        }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

/// Bottom-border meter for a password being typed
fn strength_meter(password: &str) -> Option<Line<'static>> {
    let strength = PasswordStrength::of(password);
    if strength.label().is_empty() {
        return None;
    }
    let filled = (strength.ratio() * STRENGTH_BAR_WIDTH as f64).round() as usize;
    let color = match strength.score {
        1 => Color::Red,
        2 => Color::Yellow,
        3 => Color::Blue,
        _ => Color::Green,
    };
    Some(Line::from(vec![
        Span::raw(" "),
        Span::styled("█".repeat(filled), Style::default().fg(color)),
        Span::styled(
            "░".repeat(STRENGTH_BAR_WIDTH - filled),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(format!(" {} ", strength.label()), Style::default().fg(color)),
    ]))
}

/// What a select row shows in place of a value
fn select_text(link: &SelectionLink) -> (String, Style) {
    let muted = Style::default().fg(Color::DarkGray);
    if link.loading {
        return ("Loading…".to_string(), Style::default().fg(Color::Yellow));
    }
    if let Some(label) = link.selected_label() {
        return (label.to_string(), Style::default().fg(Color::White));
    }
    if link.source == OptionSource::Unavailable {
        return ("Not available yet".to_string(), muted);
    }
    if link.options.is_empty() {
        return ("No options".to_string(), muted);
    }
    (format!("Select… ({} options)", link.options.len()), muted)
}

/// Draw one level of a selection cascade
pub fn draw_select(
    frame: &mut Frame,
    area: Rect,
    link: &SelectionLink,
    is_active: bool,
    locked: bool,
    error: Option<&str>,
) {
    let (text, style) = select_text(link);
    let style = if is_active && link.selected.is_some() {
        style.fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        style
    };

    let mut spans = Vec::new();
    let can_cycle = is_active && !locked && !link.loading && !link.options.is_empty();
    if can_cycle {
        spans.push(Span::styled("◂ ", Style::default().fg(Color::Cyan)));
    }
    spans.push(Span::styled(text, style));
    if can_cycle {
        spans.push(Span::styled(" ▸", Style::default().fg(Color::Cyan)));
    }
    if locked {
        spans.push(Span::styled(" (fixed)", Style::default().fg(Color::DarkGray)));
    }

    let block = row_block(field_title(&link.label, true), is_active, error);
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}
