//! Form domain layer
//!
//! Type-safe form handling for the login screen and the entity creation
//! views.

mod field;
mod form_state;
pub mod validation;

pub use field::FormField;
pub use form_state::{EntityForm, Form, FormRow, FormState, LoginForm};

/// Field name to JSON value, as posted to the backend
pub type FormRecord = serde_json::Map<String, serde_json::Value>;
