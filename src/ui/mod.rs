//! UI module for rendering the TUI

mod components;
mod forms;
mod home;
mod layout;
mod lists;
mod login;
mod widgets;

use crate::app::App;
use crate::state::View;
use components::{render_confirm_dialog, render_error_dialog};
use ratatui::Frame;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();

    match app.state.current_view {
        View::Login => {
            let main_area = layout::create_layout_no_sidebar(area);
            login::draw(frame, main_area, app);
        }
        view => {
            let (sidebar_area, main_area) = layout::create_layout(area);
            layout::draw_sidebar(frame, sidebar_area, app);
            match view {
                View::Home | View::Login => home::draw(frame, main_area, app),
                View::List(kind) => lists::draw_list(frame, main_area, app, kind),
                View::Create(_) => forms::draw_entity_form(frame, main_area, app),
            }
        }
    }

    layout::draw_status_bar(frame, app);

    // Overlays
    if let Some(action) = &app.state.pending_delete {
        render_confirm_dialog(frame, action, app.state.delete_submission.is_submitting());
    }
    if let Some(error) = app.state.current_error() {
        let queued = app.state.error_queue.len().saturating_sub(1);
        render_error_dialog(frame, error, queued);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::memory::MemoryBackend;
    use crate::config::AppContext;
    use crate::state::{
        EntityForm, EntityId, EntityKind, EntitySummary, FormState, PendingDeleteAction,
        SessionUser,
    };
    use ratatui::{backend::TestBackend, Terminal};

    fn buffer_to_string(buf: &ratatui::buffer::Buffer) -> String {
        let mut s = String::new();
        for y in 0..buf.area.height {
            for x in 0..buf.area.width {
                s.push(buf[(x, y)].symbol().chars().next().unwrap_or(' '));
            }
            s.push('\n');
        }
        s
    }

    fn render(app: &App) -> String {
        let backend = TestBackend::new(110, 40);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();
        buffer_to_string(terminal.backend().buffer())
    }

    fn app() -> App {
        App::new(AppContext::default(), MemoryBackend::seeded().into_gateways())
    }

    fn signed_in(role: &str) -> App {
        let mut app = app();
        app.state.session = Some(SessionUser {
            id: 1,
            username: "root".into(),
            role: Some(role.into()),
            ..Default::default()
        });
        app.state.session_checked = true;
        app
    }

    fn with_clients(app: &mut App) {
        let list = app.state.list_mut(EntityKind::Client);
        list.items = vec![
            serde_json::from_value::<EntitySummary>(serde_json::json!({
                "id": 5, "name": "Acme", "email": "office@acme.io"
            }))
            .unwrap(),
            serde_json::from_value::<EntitySummary>(serde_json::json!({
                "id": 6, "name": "Globex", "is_active": false
            }))
            .unwrap(),
        ];
        list.loaded = true;
        app.state.current_view = View::List(EntityKind::Client);
    }

    mod screens {
        use super::*;

        #[test]
        fn test_login_screen_has_no_sidebar() {
            let output = render(&app());
            assert!(output.contains("Examlyx Admin"));
            assert!(output.contains("Username"));
            assert!(output.contains("Password"));
            assert!(!output.contains("1 Profile"));
        }

        #[test]
        fn test_home_shows_profile_and_sidebar() {
            let mut app = signed_in("superadmin");
            app.state.current_view = View::Home;
            let output = render(&app);
            assert!(output.contains("Welcome, root"));
            assert!(output.contains("1 Profile"));
            assert!(output.contains("2 Clients"));
        }

        #[test]
        fn test_admin_sidebar_hides_clients() {
            let mut app = signed_in("admin");
            app.state.current_view = View::Home;
            let output = render(&app);
            assert!(!output.contains("Clients"));
            assert!(output.contains("2 Admins"));
        }

        #[test]
        fn test_list_shows_rows_and_counts() {
            let mut app = signed_in("superadmin");
            with_clients(&mut app);
            let output = render(&app);
            assert!(output.contains("Showing 2 of 2"));
            assert!(output.contains("Acme"));
            assert!(output.contains("office@acme.io"));
            assert!(output.contains("inactive"));
        }

        #[test]
        fn test_list_search_narrows_rows() {
            let mut app = signed_in("superadmin");
            with_clients(&mut app);
            app.state.list_mut(EntityKind::Client).search = "glob".into();
            let output = render(&app);
            assert!(output.contains("Search: glob"));
            assert!(output.contains("Showing 1 of 2"));
            assert!(!output.contains("Acme"));
        }

        #[test]
        fn test_unloaded_list_shows_loading() {
            let mut app = signed_in("superadmin");
            app.state.current_view = View::List(EntityKind::Student);
            assert!(render(&app).contains("Loading students…"));
        }

        #[test]
        fn test_client_form_shows_first_step() {
            let mut app = signed_in("superadmin");
            let (form, _) = EntityForm::new(EntityKind::Client, app.state.session.as_ref());
            app.state.form = FormState::Entity(Box::new(form));
            app.state.current_view = View::Create(EntityKind::Client);
            let output = render(&app);
            assert!(output.contains("New Client"));
            assert!(output.contains("Step 1 of 2"));
            assert!(output.contains("Client Name *"));
            assert!(output.contains("YYYY-MM-DD"));
            assert!(!output.contains("S3 Bucket Name"));
        }

        #[test]
        fn test_form_errors_are_drawn_beside_fields() {
            let mut app = signed_in("superadmin");
            let (mut form, _) = EntityForm::new(EntityKind::Client, app.state.session.as_ref());
            assert!(!form.next_step());
            app.state.form = FormState::Entity(Box::new(form));
            app.state.current_view = View::Create(EntityKind::Client);
            let output = render(&app);
            assert!(output.contains("Step 1 of 2"));
            assert!(output.contains("Fix the highlighted fields"));
        }
    }

    mod overlays {
        use super::*;

        #[test]
        fn test_error_dialog_counts_queued_errors() {
            let mut app = signed_in("superadmin");
            app.state.current_view = View::Home;
            app.push_error("Could not reach the server");
            app.push_error("Another problem");
            let output = render(&app);
            assert!(output.contains("Could not reach the server"));
            assert!(output.contains("(1 more)"));
        }

        #[test]
        fn test_confirm_dialog_names_the_entity() {
            let mut app = signed_in("superadmin");
            with_clients(&mut app);
            app.state.pending_delete = Some(PendingDeleteAction {
                kind: EntityKind::Client,
                id: EntityId(5),
                entity_display: "Acme".into(),
                selected_option: false,
            });
            let output = render(&app);
            assert!(output.contains("Delete Client"));
            assert!(output.contains("#5 Acme?"));
            assert!(output.contains("▸ Cancel"));
        }
    }
}
