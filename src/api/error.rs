//! Error taxonomy for backend calls
//!
//! The backend answers failures with several payload shapes: a map of
//! field names to messages (or message arrays), a single `error`/`detail`
//! string, or nothing at all. The shape is decided once here so call sites
//! only ever match on [`ApiError`].

use crate::state::EntityKind;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Field name to message mapping shown inline on forms
pub type FieldErrors = BTreeMap<String, String>;

/// Keys that carry a form-wide message rather than a field error
const GENERIC_KEYS: &[&str] = &["error", "detail", "message", "non_field_errors"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Backend rejected specific fields
    #[error("{} field(s) rejected by the server", .0.len())]
    Fields(FieldErrors),

    /// Backend rejected the request with a single message
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// Session cookie missing or expired
    #[error("session expired, please sign in again")]
    SessionExpired,

    /// No response from the server
    #[error("network error: {0}")]
    Network(String),

    /// Response arrived but could not be understood
    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("{operation} is not supported for {kind}")]
    Unsupported {
        operation: &'static str,
        kind: EntityKind,
    },
}

impl ApiError {
    /// Classify a non-2xx response body
    pub fn from_response(status: u16, body: &Value) -> Self {
        if status == 401 || (status == 403 && mentions_credentials(body)) {
            return Self::SessionExpired;
        }

        match body {
            Value::Object(map) => {
                let fields: FieldErrors = map
                    .iter()
                    .filter(|(key, _)| !GENERIC_KEYS.contains(&key.as_str()))
                    .filter_map(|(key, value)| flatten_messages(value).map(|m| (key.clone(), m)))
                    .collect();
                if !fields.is_empty() {
                    return Self::Fields(fields);
                }

                let message = GENERIC_KEYS
                    .iter()
                    .find_map(|key| map.get(*key).and_then(flatten_messages))
                    .unwrap_or_else(|| default_message(status));
                Self::Rejected { status, message }
            }
            Value::String(s) if !s.trim().is_empty() => Self::Rejected {
                status,
                message: s.clone(),
            },
            _ => Self::Rejected {
                status,
                message: default_message(status),
            },
        }
    }

    /// Whether retrying the same request could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Join a string or an array of strings into one message
fn flatten_messages(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Array(items) => {
            let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(", "))
            }
        }
        _ => None,
    }
}

fn mentions_credentials(body: &Value) -> bool {
    body.get("detail")
        .and_then(Value::as_str)
        .is_some_and(|d| d.to_lowercase().contains("credentials"))
}

fn default_message(status: u16) -> String {
    format!("Request failed with status {status}")
}
