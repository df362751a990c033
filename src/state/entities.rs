//! Entity types exchanged with the Examlyx backend

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kinds of organizational entity managed by the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Client,
    Admin,
    Teacher,
    Student,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Client,
        EntityKind::Admin,
        EntityKind::Teacher,
        EntityKind::Student,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Client => "Client",
            Self::Admin => "Admin",
            Self::Teacher => "Teacher",
            Self::Student => "Student",
        }
    }

    pub fn plural(&self) -> &'static str {
        match self {
            Self::Client => "Clients",
            Self::Admin => "Admins",
            Self::Teacher => "Teachers",
            Self::Student => "Students",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Backend identifier of a created or listed entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub i64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A row in one of the entity list screens.
///
/// Clients carry `name`; user accounts carry `first_name`/`last_name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySummary {
    pub id: i64,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub client_name: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl EntitySummary {
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.to_string();
        }
        let full = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default()
        );
        let full = full.trim();
        if !full.is_empty() {
            return full.to_string();
        }
        self.username
            .clone()
            .unwrap_or_else(|| format!("#{}", self.id))
    }

    /// Case-insensitive match against name, email and phone number
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        let haystacks = [
            Some(self.display_name()),
            self.email.clone(),
            self.phone_number.clone(),
        ];
        haystacks
            .iter()
            .flatten()
            .any(|h| h.to_lowercase().contains(&term))
    }
}

/// One selectable entry in a dropdown-style field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionItem {
    pub id: i64,
    #[serde(alias = "name")]
    pub label: String,
}

impl OptionItem {
    pub fn new(id: i64, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
        }
    }
}

/// Per-client feature switches
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    pub is_user_course: bool,
    pub is_course_program_flow: bool,
    pub is_course_batch_flow: bool,
    pub is_s3_enabled: bool,
    pub s3_bucket_link: Option<String>,
    pub s3_bucket_name: Option<String>,
    pub is_subscription_base_client: bool,
}

/// The signed-in user as reported by the session endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Option<String>,
    pub roles: Vec<String>,
    pub first_name: String,
    pub last_name: String,
    pub client_id: Option<i64>,
}

impl SessionUser {
    pub fn is_superadmin(&self) -> bool {
        self.role.as_deref() == Some("superadmin") || self.roles.iter().any(|r| r == "superadmin")
    }

    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}
