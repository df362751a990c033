//! Confirmation dialog component for destructive actions

use super::base::centered;
use crate::state::PendingDeleteAction;
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

/// Render a confirmation dialog for delete action
pub fn render_confirm_dialog(frame: &mut Frame, action: &PendingDeleteAction, deleting: bool) {
    let dialog_width = 50u16;
    let dialog_height = 11u16;
    let dialog_area = centered(frame.area(), dialog_width, dialog_height);

    frame.render_widget(Clear, dialog_area);

    let max_display_len = (dialog_width - 6) as usize;
    let display_text = truncate_string(&action.entity_display, max_display_len);

    let mut content = vec![
        Line::from(Span::styled(
            format!("Delete {}", action.kind),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Are you sure you want to delete",
            Style::default().fg(Color::White),
        )),
        Line::from(vec![
            Span::styled(format!("#{} ", action.id), Style::default().fg(Color::Cyan)),
            Span::styled(display_text, Style::default().fg(Color::White)),
            Span::styled("?", Style::default().fg(Color::White)),
        ]),
        Line::from(Span::styled(
            "This cannot be undone.",
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(""),
    ];

    if deleting {
        content.push(Line::from(Span::styled(
            "Deleting…",
            Style::default().fg(Color::Yellow),
        )));
        content.push(Line::from(""));
    } else {
        let options = [(false, "Cancel", Color::White), (true, "Delete", Color::Red)];
        for (is_delete, label, color) in options {
            let is_selected = action.selected_option == is_delete;
            let prefix = if is_selected { "▸ " } else { "  " };
            let style = if is_selected {
                Style::default().fg(color).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            content.push(Line::from(Span::styled(format!("{prefix}{label}"), style)));
        }
    }

    content.push(Line::from(""));
    content.push(Line::from(vec![
        Span::styled("↑↓", Style::default().fg(Color::Cyan)),
        Span::styled(" select  ", Style::default().fg(Color::DarkGray)),
        Span::styled("Enter", Style::default().fg(Color::Cyan)),
        Span::styled(" confirm  ", Style::default().fg(Color::DarkGray)),
        Span::styled("Esc", Style::default().fg(Color::Cyan)),
        Span::styled(" cancel", Style::default().fg(Color::DarkGray)),
    ]));

    let dialog = Paragraph::new(content)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .style(Style::default().bg(Color::Black)),
        )
        .style(Style::new().bg(Color::Black).fg(Color::White));

    frame.render_widget(dialog, dialog_area);
}

/// Truncate a string to a maximum number of characters with ellipsis
fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
