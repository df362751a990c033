//! Application state definitions

use crate::state::{EntityId, EntityKind, EntitySummary, FormState, FormSubmissionController, SessionUser};
use std::collections::{HashMap, VecDeque};

/// Current view in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Login,
    /// Profile of the signed-in user
    Home,
    List(EntityKind),
    Create(EntityKind),
}

impl View {
    /// Returns true if this view is a form
    pub fn is_form_view(&self) -> bool {
        matches!(self, View::Login | View::Create(_))
    }

    pub fn title(&self) -> String {
        match self {
            View::Login => "Sign in".to_string(),
            View::Home => "Profile".to_string(),
            View::List(kind) => kind.plural().to_string(),
            View::Create(kind) => format!("New {kind}"),
        }
    }

    /// Whether the sidebar entry `item` should be highlighted on this view.
    ///
    /// A list and its create screen share one entry.
    pub fn matches_sidebar(&self, item: &View) -> bool {
        match (item, self) {
            (View::List(a), View::List(b) | View::Create(b)) => a == b,
            (a, b) => a == b,
        }
    }
}

/// A list of entities as loaded from the backend
#[derive(Debug, Clone, Default)]
pub struct EntityList {
    pub items: Vec<EntitySummary>,
    pub loading: bool,
    pub loaded: bool,
    pub error: Option<String>,
    pub search: String,
    /// Typing goes to the search box
    pub searching: bool,
    pub selected_index: usize,
}

impl EntityList {
    /// Rows matching the search term
    pub fn filtered(&self) -> Vec<&EntitySummary> {
        self.items.iter().filter(|e| e.matches(&self.search)).collect()
    }

    pub fn selected(&self) -> Option<&EntitySummary> {
        self.filtered().get(self.selected_index).copied()
    }

    pub fn showing_label(&self) -> String {
        format!("Showing {} of {}", self.filtered().len(), self.items.len())
    }

    pub fn move_selection_down(&mut self) {
        let max = self.filtered().len();
        if self.selected_index + 1 < max {
            self.selected_index += 1;
        }
    }

    pub fn move_selection_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    /// Keep the selection inside the filtered rows
    pub fn clamp_selection(&mut self) {
        let max = self.filtered().len();
        if self.selected_index >= max {
            self.selected_index = max.saturating_sub(1);
        }
    }
}

/// Delete waiting for confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDeleteAction {
    pub kind: EntityKind,
    pub id: EntityId,
    pub entity_display: String,
    /// true = Delete highlighted, false = Cancel
    pub selected_option: bool,
}

#[derive(Debug, Default)]
pub struct AppState {
    // Navigation
    pub current_view: View,
    pub view_history: Vec<View>,
    pub sidebar_index: usize,

    // Session
    pub session: Option<SessionUser>,
    /// Initial session check finished
    pub session_checked: bool,

    // Data
    pub lists: HashMap<EntityKind, EntityList>,

    // Forms
    pub form: FormState,

    // Deletes
    pub pending_delete: Option<PendingDeleteAction>,
    pub delete_submission: FormSubmissionController,

    // Notifications
    pub error_queue: VecDeque<String>,
    pub status_message: Option<String>,
}

impl AppState {
    pub fn is_superadmin(&self) -> bool {
        self.session.as_ref().is_some_and(SessionUser::is_superadmin)
    }

    /// Sidebar entries visible to the signed-in user
    pub fn sidebar_items(&self) -> Vec<View> {
        let mut items = vec![View::Home];
        items.extend(
            EntityKind::ALL
                .iter()
                .filter(|kind| **kind != EntityKind::Client || self.is_superadmin())
                .map(|kind| View::List(*kind)),
        );
        items
    }

    /// Index of the sidebar entry for the current view
    pub fn active_sidebar_index(&self) -> Option<usize> {
        self.sidebar_items()
            .iter()
            .position(|item| self.current_view.matches_sidebar(item))
    }

    pub fn can_view(&self, view: &View) -> bool {
        match view {
            View::Login => true,
            _ if self.session.is_none() => false,
            View::List(EntityKind::Client) | View::Create(EntityKind::Client) => {
                self.is_superadmin()
            }
            _ => true,
        }
    }

    pub fn list(&self, kind: EntityKind) -> Option<&EntityList> {
        self.lists.get(&kind)
    }

    pub fn list_mut(&mut self, kind: EntityKind) -> &mut EntityList {
        self.lists.entry(kind).or_default()
    }

    /// Push an error message to the error queue for display
    pub fn push_error(&mut self, message: String) {
        self.error_queue.push_back(message);
    }

    pub fn current_error(&self) -> Option<&str> {
        self.error_queue.front().map(String::as_str)
    }

    pub fn dismiss_error(&mut self) {
        self.error_queue.pop_front();
    }

    /// Forget everything tied to the signed-in user
    pub fn clear_session(&mut self) {
        self.session = None;
        self.lists.clear();
        self.form = FormState::None;
        self.pending_delete = None;
        self.view_history.clear();
        self.sidebar_index = 0;
    }
}
