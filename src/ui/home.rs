//! Profile of the signed-in user

use crate::app::App;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub fn draw(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title(" Profile ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let Some(user) = &app.state.session else {
        let content = Paragraph::new("Not signed in")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(content, area);
        return;
    };

    let label = Style::default().fg(Color::DarkGray);
    let row = |name: &'static str, value: String| {
        Line::from(vec![
            Span::styled(format!("{name:<12}"), label),
            Span::raw(value),
        ])
    };

    let role = if user.is_superadmin() {
        "superadmin".to_string()
    } else {
        user.role.clone().unwrap_or_else(|| user.roles.join(", "))
    };

    let mut lines = vec![
        Line::from(Span::styled(
            format!("Welcome, {}", user.display_name()),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        row("Username", user.username.clone()),
        row("Email", user.email.clone()),
        row("Role", role),
    ];
    if let Some(client_id) = user.client_id {
        lines.push(row("Client", format!("#{client_id}")));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Use the number keys or Tab to open a list.",
        label,
    )));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
