//! Sign-in screen

use super::components::centered;
use super::forms::draw_field;
use crate::app::App;
use crate::state::{FormState, LoginForm};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

const LOGIN_WIDTH: u16 = 50;
const LOGIN_HEIGHT: u16 = 14;

/// Draw the sign-in form centred in `area`
pub fn draw(frame: &mut Frame, area: Rect, app: &App) {
    let FormState::Login(login) = &app.state.form else {
        return;
    };

    let box_area = centered(area, LOGIN_WIDTH, LOGIN_HEIGHT);
    let block = Block::default()
        .title(" Examlyx Admin ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(box_area);
    frame.render_widget(block, box_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Subtitle
            Constraint::Length(1),
            Constraint::Length(3), // Username
            Constraint::Length(3), // Password
            Constraint::Length(1),
            Constraint::Min(1), // Status
        ])
        .horizontal_margin(1)
        .split(inner);

    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            "Sign in to manage your organization",
            Style::default().fg(Color::DarkGray),
        ))),
        chunks[0],
    );

    draw_field(frame, chunks[2], &login.username, login.active_field_index == 0, None);
    draw_field(frame, chunks[3], &login.password, login.active_field_index == 1, None);

    frame.render_widget(Paragraph::new(status_line(login, app)), chunks[5]);
}

fn status_line<'a>(login: &'a LoginForm, app: &App) -> Line<'a> {
    if login.submitting {
        return Line::from(Span::styled(
            "Signing in…",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));
    }
    if let Some(error) = &login.error {
        return Line::from(Span::styled(error.as_str(), Style::default().fg(Color::Red)));
    }
    if !app.state.session_checked {
        return Line::from(Span::styled(
            "Checking for an existing session…",
            Style::default().fg(Color::DarkGray),
        ));
    }
    Line::from(Span::styled(
        "Enter to sign in",
        Style::default().fg(Color::DarkGray),
    ))
}
