//! Application state and core logic

use crate::api::{ApiError, Gateways};
use crate::config::AppContext;
use crate::events::{self, AppEvent, EventReceiver, EventSender};
use crate::platform::is_form_shortcut;
use crate::state::{
    AppState, EntityForm, EntityId, EntityKind, Form, FormRow, FormState, LoginForm,
    OptionRequest, PendingDeleteAction, SessionUser, SubmissionResult, SubmitOutcome,
    SubmitTicket, View,
};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use std::future::Future;

/// Main application struct
pub struct App {
    /// Current application state
    pub state: AppState,
    /// Resolved settings the app was started with
    pub context: AppContext,
    gateways: Gateways,
    events_tx: EventSender,
    events_rx: EventReceiver,
    /// Whether the app should quit
    quit: bool,
}

impl App {
    /// Create a new App instance
    pub fn new(context: AppContext, gateways: Gateways) -> Self {
        let (events_tx, events_rx) = events::channel();
        let state = AppState {
            form: FormState::Login(LoginForm::new()),
            ..Default::default()
        };
        Self {
            state,
            context,
            gateways,
            events_tx,
            events_rx,
            quit: false,
        }
    }

    /// Look for an existing session cookie
    pub fn start(&mut self) {
        let auth = self.gateways.auth.clone();
        self.spawn(async move { AppEvent::SessionChecked(auth.check_session().await) });
    }

    /// Check if app should quit
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Push an error message to the error queue for display
    pub fn push_error(&mut self, message: impl Into<String>) {
        self.state.push_error(message.into());
    }

    /// Run a backend call in the background and deliver its event
    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = AppEvent> + Send + 'static,
    {
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            // receiver only goes away on shutdown
            let _ = tx.send(task.await);
        });
    }

    /// Apply every event that has already arrived
    pub fn drain_events(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    /// Wait for the next background result
    pub async fn next_event(&mut self) -> Option<AppEvent> {
        self.events_rx.recv().await
    }

    /// Navigate to a new view
    pub fn navigate(&mut self, view: View) {
        self.state.view_history.push(self.state.current_view);
        self.state.current_view = view;
        if let Some(index) = self.state.active_sidebar_index() {
            self.state.sidebar_index = index;
        }
    }

    /// Return to the last non-form view
    pub fn go_back(&mut self) {
        while let Some(view) = self.state.view_history.pop() {
            if view.is_form_view() {
                continue;
            }
            self.state.current_view = view;
            if let Some(index) = self.state.active_sidebar_index() {
                self.state.sidebar_index = index;
            }
            return;
        }
        self.state.current_view = View::Home;
    }

    /// Open a view, loading whatever it shows
    pub fn open_view(&mut self, view: View) {
        if !self.state.can_view(&view) {
            tracing::debug!(?view, "view not available for this session");
            return;
        }
        match view {
            View::List(kind) => {
                self.navigate(view);
                if !self.state.list(kind).is_some_and(|l| l.loaded || l.loading) {
                    self.load_list(kind);
                }
            }
            View::Create(kind) => {
                let (form, requests) = EntityForm::new(kind, self.state.session.as_ref());
                self.state.form = FormState::Entity(Box::new(form));
                for request in requests {
                    self.load_options(request);
                }
                self.navigate(view);
            }
            View::Home | View::Login => self.navigate(view),
        }
    }

    fn load_list(&mut self, kind: EntityKind) {
        let list = self.state.list_mut(kind);
        list.loading = true;
        list.error = None;
        let entities = self.gateways.entities.clone();
        self.spawn(async move {
            AppEvent::ListLoaded {
                kind,
                result: entities.list(kind).await,
            }
        });
    }

    fn load_options(&self, request: OptionRequest) {
        let gateways = self.gateways.clone();
        self.spawn(async move {
            AppEvent::OptionsLoaded {
                request,
                result: gateways.load_options(request.source, request.key).await,
            }
        });
    }

    /// Drop the session and show the login screen
    fn session_expired(&mut self) {
        tracing::info!("session expired");
        self.state.clear_session();
        let mut login = LoginForm::new();
        login.error = Some("Your session has expired. Please sign in again.".to_string());
        self.state.form = FormState::Login(login);
        self.state.current_view = View::Login;
    }

    /// Apply a background result
    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::SessionChecked(result) => {
                self.state.session_checked = true;
                match result {
                    Ok(Some(user)) => self.signed_in(user),
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "session check failed");
                        self.state.status_message = Some(format!("Backend unavailable: {e}"));
                    }
                }
            }
            AppEvent::LoggedIn(result) => match result {
                Ok(user) => self.signed_in(user),
                Err(e) => {
                    tracing::info!(error = %e, "sign in rejected");
                    if let Some(login) = self.state.form.login_mut() {
                        login.submitting = false;
                        login.error = Some(e.to_string());
                    }
                }
            },
            AppEvent::LoggedOut(result) => {
                if let Err(e) = result {
                    tracing::warn!(error = %e, "logout request failed");
                }
                self.state.clear_session();
                self.state.form = FormState::Login(LoginForm::new());
                self.state.current_view = View::Login;
                self.state.status_message = Some("Signed out".to_string());
            }
            AppEvent::ListLoaded { .. } if self.state.session.is_none() => {
                tracing::debug!("signed out, dropping list result");
            }
            AppEvent::ListLoaded { kind, result } => match result {
                Ok(items) => {
                    let list = self.state.list_mut(kind);
                    list.items = items;
                    list.loading = false;
                    list.loaded = true;
                    list.clamp_selection();
                }
                Err(ApiError::SessionExpired) => self.session_expired(),
                Err(e) => {
                    if e.is_retryable() {
                        tracing::warn!(%kind, error = %e, "backend unreachable while loading list");
                    } else {
                        tracing::error!(%kind, error = %e, "failed to load list");
                    }
                    let list = self.state.list_mut(kind);
                    list.loading = false;
                    list.error = Some(e.to_string());
                }
            },
            AppEvent::OptionsLoaded { request, result } => {
                if matches!(result, Err(ApiError::SessionExpired)) {
                    self.session_expired();
                    return;
                }
                match self.state.form.entity_mut() {
                    Some(form) => {
                        form.apply_options(&request, result);
                    }
                    None => tracing::debug!(?request, "form closed, dropping options"),
                }
            }
            AppEvent::Submitted {
                ticket,
                kind,
                result,
            } => self.finish_submit(ticket, kind, result),
            AppEvent::Deleted {
                ticket,
                kind,
                id,
                result,
            } => {
                if !self.state.delete_submission.complete(ticket) {
                    tracing::debug!(%kind, %id, "stale delete result");
                    return;
                }
                self.state.pending_delete = None;
                match result {
                    Ok(()) => {
                        tracing::info!(%kind, %id, "deleted");
                        self.state.status_message = Some(format!("{kind} deleted"));
                        if self.state.session.is_some() {
                            self.load_list(kind);
                        }
                    }
                    Err(ApiError::SessionExpired) => self.session_expired(),
                    Err(e) => {
                        tracing::warn!(%kind, %id, error = %e, "delete failed");
                        self.push_error(format!("Could not delete {}: {e}", kind.label().to_lowercase()));
                    }
                }
            }
        }
    }

    fn signed_in(&mut self, user: SessionUser) {
        tracing::info!(user = %user.username, superadmin = user.is_superadmin(), "session active");
        self.state.session = Some(user);
        self.state.form = FormState::None;
        self.state.view_history.clear();
        self.state.current_view = View::Home;
        self.state.sidebar_index = 0;
    }

    fn finish_submit(&mut self, ticket: SubmitTicket, kind: EntityKind, result: SubmissionResult) {
        let Some(form) = self.state.form.entity_mut().filter(|f| f.kind() == kind) else {
            tracing::debug!(%kind, "form closed before submission finished");
            return;
        };
        let Some(outcome) = form.finish_submit(ticket, result) else {
            return;
        };
        match outcome {
            SubmitOutcome::Created(id) => {
                tracing::info!(%kind, %id, "created");
                self.state.form = FormState::None;
                self.state.status_message = Some(format!("{kind} created successfully"));
                self.navigate(View::List(kind));
                self.load_list(kind);
            }
            SubmitOutcome::FieldErrors => {
                self.state.status_message = Some("Please fix the highlighted fields".to_string());
            }
            SubmitOutcome::Notify(message) => self.push_error(message),
            SubmitOutcome::Reauthenticate => self.session_expired(),
        }
    }

    /// Handle a key event
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        // Handle error dialog dismissal first (modal)
        if self.state.current_error().is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.state.dismiss_error();
            }
            return Ok(());
        }

        // Handle delete confirmation (modal)
        if self.state.pending_delete.is_some() {
            self.handle_confirm_delete_key(key);
            return Ok(());
        }

        match self.state.current_view {
            View::Login => self.handle_login_key(key),
            View::Home => self.handle_home_key(key),
            View::List(kind) => self.handle_list_key(kind, key),
            View::Create(_) => self.handle_create_key(key),
        }
        Ok(())
    }

    /// Keys shared by the non-form views
    fn handle_navigation_key(&mut self, key: KeyEvent) -> bool {
        let items = self.state.sidebar_items();
        match key.code {
            KeyCode::Char('q') => self.quit = true,
            KeyCode::Char('l') => self.logout(),
            KeyCode::Tab => {
                let next = (self.state.sidebar_index + 1) % items.len();
                self.open_view(items[next]);
            }
            KeyCode::BackTab => {
                let prev = self
                    .state
                    .sidebar_index
                    .checked_sub(1)
                    .unwrap_or(items.len() - 1);
                self.open_view(items[prev]);
            }
            KeyCode::Char(c @ '1'..='9') => {
                let index = c as usize - '1' as usize;
                if let Some(view) = items.get(index) {
                    self.open_view(*view);
                }
            }
            _ => return false,
        }
        true
    }

    fn handle_home_key(&mut self, key: KeyEvent) {
        self.handle_navigation_key(key);
    }

    fn logout(&mut self) {
        let auth = self.gateways.auth.clone();
        self.spawn(async move { AppEvent::LoggedOut(auth.logout().await) });
    }

    fn handle_login_key(&mut self, key: KeyEvent) {
        let Some(login) = self.state.form.login_mut() else {
            self.state.form = FormState::Login(LoginForm::new());
            return;
        };
        if login.submitting {
            return;
        }
        let submit = match key.code {
            KeyCode::Tab | KeyCode::Down => {
                login.next_field();
                false
            }
            KeyCode::BackTab | KeyCode::Up => {
                login.prev_field();
                false
            }
            KeyCode::Char('s') if is_form_shortcut(key.modifiers) => true,
            KeyCode::Enter if login.active_field() == 0 => {
                login.next_field();
                false
            }
            KeyCode::Enter => true,
            KeyCode::Esc => {
                self.quit = true;
                false
            }
            KeyCode::Char(c) => {
                login.error = None;
                if let Some(field) = login.get_active_field_mut() {
                    field.push_char(c);
                }
                false
            }
            KeyCode::Backspace => {
                if let Some(field) = login.get_active_field_mut() {
                    field.pop_char();
                }
                false
            }
            _ => false,
        };
        if !submit {
            return;
        }

        let Some((username, password)) = login.credentials() else {
            login.error = Some("Enter your username and password".to_string());
            return;
        };
        login.submitting = true;
        login.error = None;
        let auth = self.gateways.auth.clone();
        self.spawn(async move { AppEvent::LoggedIn(auth.login(&username, &password).await) });
    }

    fn handle_list_key(&mut self, kind: EntityKind, key: KeyEvent) {
        let list = self.state.list_mut(kind);
        if list.searching {
            match key.code {
                KeyCode::Esc => {
                    list.searching = false;
                    list.search.clear();
                }
                KeyCode::Enter => list.searching = false,
                KeyCode::Backspace => {
                    list.search.pop();
                }
                KeyCode::Char(c) => {
                    list.search.push(c);
                    list.selected_index = 0;
                }
                _ => {}
            }
            list.clamp_selection();
            return;
        }

        match key.code {
            KeyCode::Down | KeyCode::Char('j') => list.move_selection_down(),
            KeyCode::Up | KeyCode::Char('k') => list.move_selection_up(),
            KeyCode::Char('/') => list.searching = true,
            KeyCode::Char('r') => self.load_list(kind),
            KeyCode::Char('n') => self.open_view(View::Create(kind)),
            KeyCode::Char('d') => {
                let target = list.selected().map(|e| (EntityId(e.id), e.display_name()));
                if let Some((id, entity_display)) = target {
                    self.state.pending_delete = Some(PendingDeleteAction {
                        kind,
                        id,
                        entity_display,
                        selected_option: false,
                    });
                }
            }
            KeyCode::Esc => self.go_back(),
            _ => {
                self.handle_navigation_key(key);
            }
        }
    }

    fn handle_confirm_delete_key(&mut self, key: KeyEvent) {
        if self.state.delete_submission.is_submitting() {
            return;
        }
        let Some(pending) = self.state.pending_delete.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::Up | KeyCode::Down => {
                pending.selected_option = !pending.selected_option;
            }
            KeyCode::Char('y') => {
                pending.selected_option = true;
                self.confirm_delete();
            }
            KeyCode::Enter => {
                if pending.selected_option {
                    self.confirm_delete();
                } else {
                    self.state.pending_delete = None;
                }
            }
            KeyCode::Esc | KeyCode::Char('n') => self.state.pending_delete = None,
            _ => {}
        }
    }

    /// Send the delete, keeping the dialog open until the result arrives
    fn confirm_delete(&mut self) {
        let Some((kind, id)) = self.state.pending_delete.as_ref().map(|p| (p.kind, p.id)) else {
            return;
        };
        let Some(ticket) = self.state.delete_submission.begin() else {
            return;
        };
        let entities = self.gateways.entities.clone();
        self.spawn(async move {
            AppEvent::Deleted {
                ticket,
                kind,
                id,
                result: entities.delete(kind, id).await,
            }
        });
    }

    fn handle_create_key(&mut self, key: KeyEvent) {
        let Some(form) = self.state.form.entity_mut() else {
            self.go_back();
            return;
        };
        let shortcut = is_form_shortcut(key.modifiers);
        let mut request = None;
        let mut submit = false;

        match key.code {
            KeyCode::Esc => {
                self.state.form = FormState::None;
                self.go_back();
                return;
            }
            KeyCode::Char('s') if shortcut => submit = true,
            KeyCode::Char('n') if shortcut => {
                form.next_step();
            }
            KeyCode::Char('b') if shortcut => {
                form.back_step();
            }
            KeyCode::Enter => {
                if form.wizard.is_last_step() {
                    submit = true;
                } else {
                    form.next_step();
                }
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.prev_field(),
            KeyCode::Left => request = form.cycle_option(-1),
            KeyCode::Right => request = form.cycle_option(1),
            KeyCode::Backspace => request = form.backspace(),
            KeyCode::Char(c) if !shortcut => match form.active_row() {
                Some(FormRow::Select { .. }) if c == ' ' => request = form.cycle_option(1),
                Some(FormRow::Select { .. }) => {}
                _ => form.input_char(c),
            },
            _ => {}
        }

        if let Some(request) = request {
            self.load_options(request);
        }
        if submit {
            self.submit_form();
        }
    }

    fn submit_form(&mut self) {
        let Some(form) = self.state.form.entity_mut() else {
            return;
        };
        let kind = form.kind();
        let Some((ticket, record)) = form.begin_submit() else {
            return;
        };
        tracing::debug!(%kind, "submitting form");
        let entities = self.gateways.entities.clone();
        self.spawn(async move {
            AppEvent::Submitted {
                ticket,
                kind,
                result: entities.create(kind, &record).await.into(),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::memory::MemoryBackend;
    use crate::api::{
        MockAuthGateway, MockEntityGateway, MockLocationGateway, MockProgramCourseGateway,
    };
    use crossterm::event::KeyModifiers;
    use std::sync::Arc;
    use std::time::Duration;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c))).unwrap();
        }
    }

    /// Apply background results until none arrive for a short while
    async fn settle(app: &mut App) {
        while let Ok(Some(event)) =
            tokio::time::timeout(Duration::from_millis(200), app.next_event()).await
        {
            app.handle_event(event);
        }
    }

    fn superadmin() -> SessionUser {
        SessionUser {
            id: 1,
            username: "root".into(),
            role: Some("superadmin".into()),
            ..Default::default()
        }
    }

    fn signed_in(gateways: Gateways) -> App {
        let mut app = App::new(AppContext::default(), gateways);
        app.handle_event(AppEvent::LoggedIn(Ok(superadmin())));
        app
    }

    fn fill_teacher(app: &mut App) {
        // first name, last name, email, phone, password, confirm
        for value in ["Asha", "Rao", "asha@acme.io", "", "Secret#123", "Secret#123"] {
            type_text(app, value);
            app.handle_key(key(KeyCode::Tab)).unwrap();
        }
    }

    mod session {
        use super::*;

        #[tokio::test]
        async fn test_login_lands_on_home() {
            let mut app = App::new(AppContext::default(), MemoryBackend::seeded().into_gateways());
            type_text(&mut app, "root");
            app.handle_key(key(KeyCode::Enter)).unwrap();
            type_text(&mut app, "pw");
            app.handle_key(key(KeyCode::Enter)).unwrap();
            settle(&mut app).await;

            assert_eq!(app.state.current_view, View::Home);
            assert!(app.state.is_superadmin());
        }

        #[tokio::test]
        async fn test_failed_login_shows_message() {
            let mut app = App::new(AppContext::default(), MemoryBackend::seeded().into_gateways());
            type_text(&mut app, "nobody");
            app.handle_key(key(KeyCode::Tab)).unwrap();
            type_text(&mut app, "pw");
            app.handle_key(ctrl('s')).unwrap();
            settle(&mut app).await;

            assert_eq!(app.state.current_view, View::Login);
            let FormState::Login(login) = &app.state.form else {
                panic!("login form expected");
            };
            assert_eq!(login.error.as_deref(), Some("Invalid credentials"));
            assert!(!login.submitting);
        }

        #[tokio::test]
        async fn test_late_list_result_after_logout_is_dropped() {
            let mut app = signed_in(MemoryBackend::seeded().into_gateways());
            app.handle_event(AppEvent::LoggedOut(Ok(())));
            app.handle_event(AppEvent::ListLoaded {
                kind: EntityKind::Client,
                result: Ok(Vec::new()),
            });
            assert!(app.state.list(EntityKind::Client).is_none());

            app.handle_event(AppEvent::LoggedIn(Ok(superadmin())));
            app.open_view(View::List(EntityKind::Client));
            assert!(app.state.list(EntityKind::Client).unwrap().loading);
            settle(&mut app).await;
            assert_eq!(app.state.list(EntityKind::Client).unwrap().items.len(), 1);
        }

        #[tokio::test]
        async fn test_existing_session_skips_login() {
            let mut app = App::new(AppContext::default(), MemoryBackend::seeded().into_gateways());
            app.start();
            settle(&mut app).await;
            assert_eq!(app.state.current_view, View::Home);
            assert!(app.state.session_checked);
        }

        #[tokio::test]
        async fn test_expired_session_on_list_returns_to_login() {
            let mut entities = MockEntityGateway::new();
            entities
                .expect_list()
                .returning(|_| Err(ApiError::SessionExpired));
            let gateways = Gateways {
                auth: Arc::new(MockAuthGateway::new()),
                entities: Arc::new(entities),
                locations: Arc::new(MockLocationGateway::new()),
                catalog: Arc::new(MockProgramCourseGateway::new()),
            };
            let mut app = signed_in(gateways);
            app.open_view(View::List(EntityKind::Teacher));
            settle(&mut app).await;

            assert_eq!(app.state.current_view, View::Login);
            assert!(app.state.session.is_none());
        }
    }

    mod submission {
        use super::*;

        #[tokio::test]
        async fn test_double_submit_calls_gateway_once() {
            let mut entities = MockEntityGateway::new();
            entities
                .expect_create()
                .times(1)
                .returning(|_, _| Ok(EntityId(7)));
            entities.expect_list().returning(|_| Ok(vec![]));
            let gateways = Gateways {
                auth: Arc::new(MockAuthGateway::new()),
                entities: Arc::new(entities),
                locations: Arc::new(MockLocationGateway::new()),
                catalog: Arc::new(MockProgramCourseGateway::new()),
            };

            let mut app = signed_in(gateways);
            app.open_view(View::Create(EntityKind::Teacher));
            fill_teacher(&mut app);

            app.handle_key(ctrl('s')).unwrap();
            app.handle_key(ctrl('s')).unwrap();
            assert!(app
                .state
                .form
                .entity()
                .is_some_and(|f| f.submission.is_submitting()));

            settle(&mut app).await;
            assert_eq!(app.state.current_view, View::List(EntityKind::Teacher));
            assert_eq!(
                app.state.status_message.as_deref(),
                Some("Teacher created successfully")
            );
        }

        #[tokio::test]
        async fn test_backend_field_errors_stay_on_form() {
            let mut entities = MockEntityGateway::new();
            entities.expect_create().returning(|_, _| {
                let mut fields = crate::api::FieldErrors::new();
                fields.insert("email".into(), "Email already registered.".into());
                Err(ApiError::Fields(fields))
            });
            let gateways = Gateways {
                auth: Arc::new(MockAuthGateway::new()),
                entities: Arc::new(entities),
                locations: Arc::new(MockLocationGateway::new()),
                catalog: Arc::new(MockProgramCourseGateway::new()),
            };

            let mut app = signed_in(gateways);
            app.open_view(View::Create(EntityKind::Teacher));
            fill_teacher(&mut app);
            app.handle_key(ctrl('s')).unwrap();
            settle(&mut app).await;

            assert_eq!(app.state.current_view, View::Create(EntityKind::Teacher));
            let form = app.state.form.entity().unwrap();
            assert_eq!(form.wizard.error("email"), Some("Email already registered."));
            assert!(!form.submission.is_submitting());
        }

        #[tokio::test]
        async fn test_network_failure_keeps_form_and_notifies() {
            let mut entities = MockEntityGateway::new();
            entities
                .expect_create()
                .returning(|_, _| Err(ApiError::Network("connection refused".into())));
            let gateways = Gateways {
                auth: Arc::new(MockAuthGateway::new()),
                entities: Arc::new(entities),
                locations: Arc::new(MockLocationGateway::new()),
                catalog: Arc::new(MockProgramCourseGateway::new()),
            };

            let mut app = signed_in(gateways);
            app.open_view(View::Create(EntityKind::Teacher));
            fill_teacher(&mut app);
            app.handle_key(ctrl('s')).unwrap();
            settle(&mut app).await;

            assert!(app.state.current_error().is_some_and(|e| e.contains("try again")));
            assert!(app.state.form.entity().is_some());

            // error dialog is modal until dismissed
            app.handle_key(key(KeyCode::Esc)).unwrap();
            assert_eq!(app.state.current_error(), None);
            assert_eq!(app.state.current_view, View::Create(EntityKind::Teacher));
        }
    }

    mod student_flow {
        use super::*;

        #[tokio::test]
        async fn test_student_created_through_cascades() {
            let mut app = signed_in(MemoryBackend::seeded().into_gateways());
            app.open_view(View::Create(EntityKind::Student));
            settle(&mut app).await;

            // client, then the program it offers
            app.handle_key(key(KeyCode::Right)).unwrap();
            settle(&mut app).await;
            app.handle_key(key(KeyCode::Tab)).unwrap();
            app.handle_key(key(KeyCode::Right)).unwrap();
            settle(&mut app).await;
            app.handle_key(key(KeyCode::Tab)).unwrap();
            app.handle_key(key(KeyCode::Tab)).unwrap();
            fill_teacher(&mut app);

            // country India, then Kerala
            app.handle_key(key(KeyCode::Tab)).unwrap();
            app.handle_key(key(KeyCode::Right)).unwrap();
            settle(&mut app).await;
            app.handle_key(key(KeyCode::Tab)).unwrap();
            app.handle_key(key(KeyCode::Right)).unwrap();
            settle(&mut app).await;

            let form = app.state.form.entity().unwrap();
            let record = form.body.to_record();
            assert_eq!(record.get("client_id"), Some(&serde_json::json!(5)));
            assert_eq!(record.get("program"), Some(&serde_json::json!(60)));
            assert_eq!(record.get("country"), Some(&serde_json::json!(1)));
            assert_eq!(record.get("state"), Some(&serde_json::json!(10)));

            app.handle_key(key(KeyCode::Enter)).unwrap();
            settle(&mut app).await;

            assert_eq!(app.state.current_view, View::List(EntityKind::Student));
            let list = app.state.list(EntityKind::Student).unwrap();
            assert_eq!(list.items.len(), 1);
            assert_eq!(list.items[0].display_name(), "Asha Rao");
        }
    }

    mod lists {
        use super::*;

        #[tokio::test]
        async fn test_delete_requires_confirmation() {
            let backend = MemoryBackend::seeded();
            let mut app = signed_in(backend.into_gateways());
            app.open_view(View::List(EntityKind::Client));
            settle(&mut app).await;
            assert_eq!(app.state.list(EntityKind::Client).unwrap().items.len(), 1);

            app.handle_key(key(KeyCode::Char('d'))).unwrap();
            assert!(app.state.pending_delete.is_some());
            // Cancel is highlighted first
            app.handle_key(key(KeyCode::Enter)).unwrap();
            assert!(app.state.pending_delete.is_none());
            settle(&mut app).await;
            assert_eq!(app.state.list(EntityKind::Client).unwrap().items.len(), 1);

            app.handle_key(key(KeyCode::Char('d'))).unwrap();
            app.handle_key(key(KeyCode::Right)).unwrap();
            app.handle_key(key(KeyCode::Enter)).unwrap();
            settle(&mut app).await;

            assert!(app.state.list(EntityKind::Client).unwrap().items.is_empty());
            assert_eq!(app.state.status_message.as_deref(), Some("Client deleted"));
        }

        #[tokio::test]
        async fn test_dialog_holds_while_delete_in_flight() {
            let mut app = signed_in(MemoryBackend::seeded().into_gateways());
            app.open_view(View::List(EntityKind::Client));
            settle(&mut app).await;

            app.handle_key(key(KeyCode::Char('d'))).unwrap();
            app.handle_key(key(KeyCode::Char('y'))).unwrap();
            assert!(app.state.delete_submission.is_submitting());
            assert!(app.state.pending_delete.is_some());

            // further input is ignored until the result lands
            app.handle_key(key(KeyCode::Char('y'))).unwrap();
            app.handle_key(key(KeyCode::Esc)).unwrap();
            assert!(app.state.pending_delete.is_some());

            settle(&mut app).await;
            assert!(app.state.pending_delete.is_none());
            assert!(!app.state.delete_submission.is_submitting());
            assert!(app.state.list(EntityKind::Client).unwrap().items.is_empty());
        }

        #[tokio::test]
        async fn test_search_narrows_rows() {
            let mut app = signed_in(MemoryBackend::seeded().into_gateways());
            app.open_view(View::List(EntityKind::Client));
            settle(&mut app).await;

            app.handle_key(key(KeyCode::Char('/'))).unwrap();
            type_text(&mut app, "zzz");
            let list = app.state.list(EntityKind::Client).unwrap();
            assert_eq!(list.showing_label(), "Showing 0 of 1");

            // typing in search does not trigger list shortcuts
            assert!(app.state.pending_delete.is_none());
            app.handle_key(key(KeyCode::Esc)).unwrap();
            assert_eq!(
                app.state.list(EntityKind::Client).unwrap().showing_label(),
                "Showing 1 of 1"
            );
        }

        #[tokio::test]
        async fn test_new_key_opens_create_and_esc_returns() {
            let mut app = signed_in(MemoryBackend::seeded().into_gateways());
            app.open_view(View::List(EntityKind::Teacher));
            settle(&mut app).await;
            app.handle_key(key(KeyCode::Char('n'))).unwrap();
            assert_eq!(app.state.current_view, View::Create(EntityKind::Teacher));
            assert_eq!(app.state.active_sidebar_index(), Some(3));

            app.handle_key(key(KeyCode::Esc)).unwrap();
            assert_eq!(app.state.current_view, View::List(EntityKind::Teacher));
            assert!(matches!(app.state.form, FormState::None));
        }
    }

    mod navigation {
        use super::*;

        #[tokio::test]
        async fn test_sidebar_digits_and_tab() {
            let mut app = signed_in(MemoryBackend::seeded().into_gateways());
            app.handle_key(key(KeyCode::Char('3'))).unwrap();
            assert_eq!(app.state.current_view, View::List(EntityKind::Admin));
            app.handle_key(key(KeyCode::Tab)).unwrap();
            assert_eq!(app.state.current_view, View::List(EntityKind::Teacher));
            app.handle_key(key(KeyCode::BackTab)).unwrap();
            assert_eq!(app.state.current_view, View::List(EntityKind::Admin));
            settle(&mut app).await;
        }

        #[tokio::test]
        async fn test_clients_hidden_from_admins() {
            let mut app = App::new(AppContext::default(), MemoryBackend::seeded().into_gateways());
            app.handle_event(AppEvent::LoggedIn(Ok(SessionUser {
                role: Some("admin".into()),
                client_id: Some(5),
                ..Default::default()
            })));
            app.open_view(View::List(EntityKind::Client));
            assert_eq!(app.state.current_view, View::Home);
        }

        #[tokio::test]
        async fn test_logout_returns_to_login() {
            let mut app = signed_in(MemoryBackend::seeded().into_gateways());
            app.handle_key(key(KeyCode::Char('l'))).unwrap();
            settle(&mut app).await;
            assert_eq!(app.state.current_view, View::Login);
            assert!(app.state.session.is_none());
        }
    }
}
