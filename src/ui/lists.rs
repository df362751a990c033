//! Client, admin, teacher and student lists

use super::widgets::render_scrollable_list;
use crate::app::App;
use crate::state::{EntityKind, EntityList, EntitySummary};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

/// Draw the list screen for `kind`
pub fn draw_list(frame: &mut Frame, area: Rect, app: &App, kind: EntityKind) {
    let block = Block::default()
        .title(format!(" {} ", kind.plural()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let Some(list) = app.state.list(kind).filter(|l| l.loaded || l.error.is_some()) else {
        let content = Paragraph::new(format!("Loading {}…", kind.plural().to_lowercase()))
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(content, area);
        return;
    };

    if let Some(error) = &list.error {
        let content = Paragraph::new(vec![
            Line::from(Span::styled(error.as_str(), Style::default().fg(Color::Red))),
            Line::from(""),
            Line::from(Span::styled(
                "Press 'r' to retry.",
                Style::default().fg(Color::DarkGray),
            )),
        ])
        .block(block);
        frame.render_widget(content, area);
        return;
    }

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Search / counts
            Constraint::Length(1),
            Constraint::Min(0), // Rows
        ])
        .split(inner);

    frame.render_widget(Paragraph::new(header_line(list)), chunks[0]);

    let rows = list.filtered();
    if rows.is_empty() {
        let message = if list.items.is_empty() {
            format!(
                "No {} yet.\nPress 'n' to create one.",
                kind.plural().to_lowercase()
            )
        } else {
            "Nothing matches the search.\nPress Esc to clear it.".to_string()
        };
        let content = Paragraph::new(message).style(Style::default().fg(Color::DarkGray));
        frame.render_widget(content, chunks[2]);
        return;
    }

    let items: Vec<ListItem> = rows
        .iter()
        .enumerate()
        .map(|(idx, entity)| list_item(entity, idx == list.selected_index))
        .collect();
    let list_widget = List::new(items);
    render_scrollable_list(frame, chunks[2], list_widget, list.selected_index);
}

fn header_line(list: &EntityList) -> Line<'_> {
    let mut spans = Vec::new();
    if list.searching || !list.search.is_empty() {
        let style = if list.searching {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::White)
        };
        spans.push(Span::styled("Search: ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::styled(list.search.as_str(), style));
        if list.searching {
            spans.push(Span::styled("▌", Style::default().fg(Color::Cyan)));
        }
        spans.push(Span::raw("  "));
    }
    spans.push(Span::styled(
        list.showing_label(),
        Style::default().fg(Color::DarkGray),
    ));
    if list.loading {
        spans.push(Span::styled(
            "  refreshing…",
            Style::default().fg(Color::Yellow),
        ));
    }
    Line::from(spans)
}

fn list_item(entity: &EntitySummary, is_selected: bool) -> ListItem<'static> {
    let prefix = if is_selected { "▸ " } else { "  " };
    let style = if is_selected {
        Style::default().bg(Color::DarkGray)
    } else {
        Style::default()
    };

    let mut spans = vec![
        Span::styled(prefix, style),
        Span::styled(format!("#{:<5}", entity.id), Style::default().fg(Color::Cyan)),
        Span::styled(entity.display_name(), style),
    ];
    if let Some(email) = &entity.email {
        spans.push(Span::styled(
            format!("  {email}"),
            Style::default().fg(Color::Gray),
        ));
    }
    if let Some(phone) = &entity.phone_number {
        spans.push(Span::styled(
            format!("  {phone}"),
            Style::default().fg(Color::DarkGray),
        ));
    }
    if let Some(client) = &entity.client_name {
        spans.push(Span::styled(
            format!("  [{client}]"),
            Style::default().fg(Color::Blue),
        ));
    }
    if !entity.is_active {
        spans.push(Span::styled(
            "  inactive",
            Style::default().fg(Color::Red),
        ));
    }

    ListItem::new(Line::from(spans))
}
