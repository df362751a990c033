//! Form field value objects

use serde_json::Value;

/// Type-safe field values
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    /// Text rendered masked
    Secret(String),
    Toggle(bool),
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Text(String::new())
    }
}

/// Represents a single form field with its configuration and value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    pub label: String,
    pub value: FieldValue,
    pub required: bool,
    /// Input hint shown while the field is empty
    pub placeholder: Option<&'static str>,
}

impl FormField {
    fn new(name: &str, label: &str, value: FieldValue) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            value,
            required: false,
            placeholder: None,
        }
    }

    /// Create a new text field
    pub fn text(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldValue::Text(String::new()))
    }

    /// Create a new masked field
    pub fn secret(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldValue::Secret(String::new()))
    }

    /// Create a new on/off field
    pub fn toggle(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldValue::Toggle(false))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_placeholder(mut self, placeholder: &'static str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    /// Get the text value (returns empty string for toggles)
    pub fn as_text(&self) -> &str {
        match &self.value {
            FieldValue::Text(s) | FieldValue::Secret(s) => s,
            FieldValue::Toggle(_) => "",
        }
    }

    /// Get the toggle value (returns false for text fields)
    pub fn is_on(&self) -> bool {
        matches!(self.value, FieldValue::Toggle(true))
    }

    pub fn is_toggle(&self) -> bool {
        matches!(self.value, FieldValue::Toggle(_))
    }

    pub fn is_blank(&self) -> bool {
        match &self.value {
            FieldValue::Text(s) | FieldValue::Secret(s) => s.trim().is_empty(),
            FieldValue::Toggle(_) => false,
        }
    }

    #[cfg(test)]
    pub fn set_text(&mut self, value: &str) {
        match &mut self.value {
            FieldValue::Text(s) | FieldValue::Secret(s) => *s = value.to_string(),
            FieldValue::Toggle(_) => {}
        }
    }

    /// Push a character to the field value; space flips a toggle
    pub fn push_char(&mut self, c: char) {
        if self.is_toggle() {
            if c == ' ' {
                self.toggle_value();
            }
            return;
        }
        if let FieldValue::Text(s) | FieldValue::Secret(s) = &mut self.value {
            s.push(c);
        }
    }

    /// Remove the last character from the field value
    pub fn pop_char(&mut self) {
        match &mut self.value {
            FieldValue::Text(s) | FieldValue::Secret(s) => {
                s.pop();
            }
            FieldValue::Toggle(_) => {}
        }
    }

    pub fn toggle_value(&mut self) {
        if let FieldValue::Toggle(on) = &mut self.value {
            *on = !*on;
        }
    }

    /// Get the display value for rendering
    pub fn display_value(&self) -> String {
        match &self.value {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Secret(s) => "•".repeat(s.chars().count()),
            FieldValue::Toggle(true) => "[x] Yes".to_string(),
            FieldValue::Toggle(false) => "[ ] No".to_string(),
        }
    }

    /// Value as sent to the backend; blank optional text becomes `null`
    pub fn to_json(&self) -> Value {
        match &self.value {
            FieldValue::Toggle(on) => Value::Bool(*on),
            FieldValue::Secret(s) => Value::String(s.clone()),
            FieldValue::Text(s) if s.trim().is_empty() && !self.required => Value::Null,
            FieldValue::Text(s) => Value::String(s.trim().to_string()),
        }
    }
}
