//! Create wizards for clients, admins, teachers and students

use super::field_renderer::{draw_field, draw_select};
use crate::app::App;
use crate::platform::{BACK_STEP_SHORTCUT, NEXT_STEP_SHORTCUT, SUBMIT_SHORTCUT};
use crate::state::{CascadeKind, EntityForm, FormRow, SelectionCascade};
use crate::ui::widgets::key_hint_line;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Rows are drawn as bordered boxes of this height
const ROW_HEIGHT: u16 = 3;

/// Draw the create form for the entity form in `app.state.form`
pub fn draw_entity_form(frame: &mut Frame, area: Rect, app: &App) {
    let Some(form) = app.state.form.entity() else {
        let content = Paragraph::new("No form open").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(content, area);
        return;
    };

    let block = Block::default()
        .title(format!(" {} ", app.state.current_view.title()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Step indicator
            Constraint::Min(0),    // Rows
            Constraint::Length(1), // Hints
        ])
        .horizontal_margin(1)
        .split(inner);

    draw_step_indicator(frame, chunks[0], form);
    draw_rows(frame, chunks[1], form);
    draw_form_hints(frame, chunks[2], form);
}

fn draw_step_indicator(frame: &mut Frame, area: Rect, form: &EntityForm) {
    let current = form.wizard.current();
    let steps = form.wizard.steps();

    let mut spans = vec![Span::styled(
        format!("Step {current} of {steps}"),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )];
    if steps > 1 {
        spans.push(Span::raw("  "));
        for step in 1..=steps {
            let (dot, color) = match step.cmp(&current) {
                std::cmp::Ordering::Less => ("●", Color::Green),
                std::cmp::Ordering::Equal => ("●", Color::Cyan),
                std::cmp::Ordering::Greater => ("○", Color::DarkGray),
            };
            spans.push(Span::styled(format!("{dot} "), Style::default().fg(color)));
        }
    }
    let loading = [CascadeKind::Organization, CascadeKind::Location]
        .into_iter()
        .filter_map(|kind| form.body.cascade(kind))
        .any(SelectionCascade::is_loading);
    if loading {
        spans.push(Span::styled(
            "  loading options…",
            Style::default().fg(Color::Yellow),
        ));
    }
    if form.wizard.has_errors() {
        spans.push(Span::styled(
            "  Fix the highlighted fields",
            Style::default().fg(Color::Red),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// First row to draw so the active row stays on screen
fn first_visible_row(active: usize, visible: usize) -> usize {
    if visible == 0 || active < visible {
        0
    } else {
        active + 1 - visible
    }
}

fn draw_rows(frame: &mut Frame, area: Rect, form: &EntityForm) {
    let rows = form.rows();
    let visible = (area.height / ROW_HEIGHT) as usize;
    let start = first_visible_row(form.active_field_index, visible);

    for (slot, (index, row)) in rows
        .iter()
        .enumerate()
        .skip(start)
        .take(visible)
        .enumerate()
    {
        let row_area = Rect {
            x: area.x,
            y: area.y + slot as u16 * ROW_HEIGHT,
            width: area.width,
            height: ROW_HEIGHT,
        };
        let is_active = index == form.active_field_index;
        let error = form.row_error(*row);

        match *row {
            FormRow::Field(i) => {
                if let Some(field) = form.body.fields.get(i) {
                    draw_field(frame, row_area, field, is_active, error);
                }
            }
            FormRow::Select { cascade, level } => {
                let cascade = form.body.cascade(cascade);
                let locked = level == 0 && cascade.is_some_and(SelectionCascade::is_locked);
                if let Some(link) = cascade.and_then(|c| c.link(level)) {
                    draw_select(frame, row_area, link, is_active, locked, error);
                }
            }
        }
    }
}

fn draw_form_hints(frame: &mut Frame, area: Rect, form: &EntityForm) {
    if form.submission.is_submitting() {
        let line = Line::from(Span::styled(
            "Submitting…",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    let mut hints = Vec::new();
    if form.wizard.current() > 1 {
        hints.push((BACK_STEP_SHORTCUT, "back"));
    }
    if form.wizard.is_last_step() {
        hints.push((SUBMIT_SHORTCUT, "submit"));
    } else {
        hints.push((NEXT_STEP_SHORTCUT, "next step"));
    }
    hints.push(("Esc", "cancel"));

    frame.render_widget(Paragraph::new(key_hint_line(&hints)), area);
}
