//! Layout components (sidebar, status bar)

use crate::app::App;
use crate::platform::{BACK_STEP_SHORTCUT, NEXT_STEP_SHORTCUT, SUBMIT_SHORTCUT};
use crate::state::View;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Sidebar entry height (top border + label + bottom border)
const NAV_ENTRY_HEIGHT: u16 = 3;

/// Create the main layout with sidebar
pub fn create_layout(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(20), // Sidebar
            Constraint::Min(0),     // Main content
        ])
        .split(area);

    // Reserve bottom line for status bar
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(chunks[1]);

    let sidebar_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(chunks[0]);

    (sidebar_chunks[0], main_chunks[0])
}

/// Full-width layout for the sign-in screen
pub fn create_layout_no_sidebar(area: Rect) -> Rect {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    chunks[0]
}

/// Draw the sidebar with boxed, numbered entries
pub fn draw_sidebar(frame: &mut Frame, area: Rect, app: &App) {
    let items = app.state.sidebar_items();

    let mut constraints = vec![Constraint::Min(0)];
    constraints.extend(items.iter().map(|_| Constraint::Length(NAV_ENTRY_HEIGHT)));
    constraints.push(Constraint::Min(0));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let active = app.state.active_sidebar_index();
    for (idx, item) in items.iter().enumerate() {
        let label = match item {
            View::Home => "Profile".to_string(),
            other => other.title(),
        };
        draw_nav_entry(frame, chunks[idx + 1], idx + 1, &label, active == Some(idx));
    }
}

/// One boxed sidebar entry; the digit is the key that opens it
fn draw_nav_entry(frame: &mut Frame, area: Rect, digit: usize, label: &str, active: bool) {
    let (border, text) = if active {
        (
            Style::default().fg(Color::Cyan),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )
    } else {
        (Style::default().fg(Color::DarkGray), Style::default())
    };
    let line = Line::from(vec![
        Span::styled(format!(" {digit} "), Style::default().fg(Color::Yellow)),
        Span::styled(label.to_string(), text),
    ]);
    let block = Block::default().borders(Borders::ALL).border_style(border);
    frame.render_widget(Paragraph::new(line).block(block), area);
}

/// Draw the status bar
pub fn draw_status_bar(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let status_area = Rect {
        x: 0,
        y: area.height.saturating_sub(1),
        width: area.width,
        height: 1,
    };

    let mut spans = vec![];

    // Session indicator
    match &app.state.session {
        Some(user) => {
            spans.push(Span::styled(" ● ", Style::default().fg(Color::Green)));
            spans.push(Span::styled(
                format!("{} ", user.username),
                Style::default().fg(Color::White),
            ));
        }
        None if !app.state.session_checked => {
            spans.push(Span::styled(" ◌ ", Style::default().fg(Color::Yellow)));
        }
        None => spans.push(Span::styled(" ○ ", Style::default().fg(Color::Red))),
    }

    let hints = get_view_hints(&app.state.current_view);
    spans.push(Span::styled(hints, Style::default().fg(Color::Gray)));

    if let Some(msg) = &app.state.status_message {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(msg, Style::default().fg(Color::Green)));
    }

    let status = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(status, status_area);

    // Backend address on the right
    let backend = format!(" {} ", app.context.api_url);
    let width = (backend.chars().count() as u16).min(area.width / 3);
    let backend_area = Rect {
        x: area.width.saturating_sub(width),
        y: area.height.saturating_sub(1),
        width,
        height: 1,
    };
    let backend_widget =
        Paragraph::new(backend).style(Style::default().bg(Color::DarkGray).fg(Color::Gray));
    frame.render_widget(backend_widget, backend_area);
}

/// Get keyboard hints for the current view
fn get_view_hints(view: &View) -> String {
    match view {
        View::Login => "Tab:next  Enter:sign in  Esc:quit".to_string(),
        View::Home => "1-9/Tab:nav  l:logout  q:quit".to_string(),
        View::List(_) => "j/k:nav  /:search  n:new  d:delete  r:reload  Esc:back".to_string(),
        View::Create(_) => format!(
            "Tab:next  ←/→:choose  {NEXT_STEP_SHORTCUT}:next  {BACK_STEP_SHORTCUT}:back  {SUBMIT_SHORTCUT}:submit  Esc:cancel"
        ),
    }
}
