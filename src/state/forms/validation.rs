//! Field-level checks shared by the creation forms

use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

/// Characters counted as "special" in passwords
const SPECIAL_CHARS: &str = "!@#$%^&*(),.?\":{}|<>";

pub const MIN_PASSWORD_LEN: usize = 8;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^\S+@\S+\.\S+$").expect("email regex"))
}

pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email.trim())
}

/// First unmet password rule, if any
pub fn password_problem(password: &str) -> Option<&'static str> {
    if password.is_empty() {
        Some("Password is required")
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        Some("Password must be at least 8 characters")
    } else if !password.chars().any(|c| c.is_ascii_uppercase()) {
        Some("Password must contain at least one uppercase letter")
    } else if !password.chars().any(|c| c.is_ascii_lowercase()) {
        Some("Password must contain at least one lowercase letter")
    } else if !password.chars().any(|c| c.is_ascii_digit()) {
        Some("Password must contain at least one number")
    } else if !password.chars().any(|c| SPECIAL_CHARS.contains(c)) {
        Some("Password must contain at least one special character")
    } else {
        None
    }
}

/// Password strength meter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordStrength {
    pub score: u8,
}

impl PasswordStrength {
    pub fn of(password: &str) -> Self {
        if password.is_empty() {
            return Self { score: 0 };
        }
        let len = password.chars().count();
        let checks = [
            len >= 8,
            len >= 12,
            password.chars().any(|c| c.is_ascii_lowercase())
                && password.chars().any(|c| c.is_ascii_uppercase()),
            password.chars().any(|c| c.is_ascii_digit()),
            password.chars().any(|c| !c.is_ascii_alphanumeric()),
        ];
        Self {
            score: checks.iter().filter(|c| **c).count() as u8,
        }
    }

    pub fn label(&self) -> &'static str {
        match self.score {
            0 => "",
            1 => "Weak",
            2 => "Fair",
            3 => "Good",
            _ => "Strong",
        }
    }

    /// Filled fraction of the meter, 0.0..=1.0
    pub fn ratio(&self) -> f64 {
        f64::from(self.score.min(4)) / 4.0
    }
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Check an optional start/end pair; the error belongs to whichever
/// field is wrong
pub fn date_range_problem(start: &str, end: &str) -> Option<(&'static str, &'static str)> {
    let (start, end) = (start.trim(), end.trim());
    let start_date = if start.is_empty() {
        None
    } else {
        match parse_date(start) {
            Some(d) => Some(d),
            None => return Some(("subscription_start_date", "Use the YYYY-MM-DD format")),
        }
    };
    let end_date = if end.is_empty() {
        None
    } else {
        match parse_date(end) {
            Some(d) => Some(d),
            None => return Some(("subscription_end_date", "Use the YYYY-MM-DD format")),
        }
    };
    match (start_date, end_date) {
        (Some(s), Some(e)) if e < s => Some((
            "subscription_end_date",
            "End date must be on or after the start date",
        )),
        _ => None,
    }
}
