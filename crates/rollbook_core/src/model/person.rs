//! Shared person fields and field validation.
//!
//! # Responsibility
//! - Hold the name/age/email triple shared by student and instructor records.
//! - Enforce field validity at construction and on every mutation.
//!
//! # Invariants
//! - A `PersonProfile` never exists with an empty name, a negative age, or
//!   an email that fails the address pattern.
//! - Failed mutations leave the previous value in place.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_.+-]+@[A-Za-z0-9-]+\.[A-Za-z0-9-.]+$").expect("valid email regex")
});

/// Field-level validation failure for domain records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Name is empty or whitespace-only.
    EmptyName,
    /// Age is below zero.
    NegativeAge(i64),
    /// Email does not match the `local@domain.tld` pattern.
    InvalidEmail(String),
    /// A business key (`student_id`, `instructor_id`, `course_id`) is empty.
    EmptyId(&'static str),
    /// Course name is empty or whitespace-only.
    EmptyCourseName,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "name cannot be empty"),
            Self::NegativeAge(age) => write!(f, "age must be non-negative, got {age}"),
            Self::InvalidEmail(email) => write!(f, "invalid email format: `{email}`"),
            Self::EmptyId(field) => write!(f, "{field} cannot be empty"),
            Self::EmptyCourseName => write!(f, "course name cannot be empty"),
        }
    }
}

impl Error for ValidationError {}

/// Returns whether `email` matches the accepted address pattern.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub(crate) fn require_id(field: &'static str, id: &str) -> Result<(), ValidationError> {
    if id.trim().is_empty() {
        return Err(ValidationError::EmptyId(field));
    }
    Ok(())
}

/// Validated name/age/email triple composed into student and instructor
/// records.
///
/// Fields are private so every write goes through a validating path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonProfile {
    name: String,
    age: i64,
    email: String,
}

impl PersonProfile {
    /// Builds a profile, rejecting any invalid field up front.
    pub fn new(
        name: impl Into<String>,
        age: i64,
        email: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let mut profile = Self {
            name: String::new(),
            age: 0,
            email: String::new(),
        };
        profile.set_name(name)?;
        profile.set_age(age)?;
        profile.set_email(email)?;
        Ok(profile)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn age(&self) -> i64 {
        self.age
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Replaces the name; rejects empty values without applying them.
    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        self.name = name;
        Ok(())
    }

    /// Replaces the age; rejects negative values without applying them.
    pub fn set_age(&mut self, age: i64) -> Result<(), ValidationError> {
        if age < 0 {
            return Err(ValidationError::NegativeAge(age));
        }
        self.age = age;
        Ok(())
    }

    /// Replaces the email; rejects malformed addresses without applying them.
    pub fn set_email(&mut self, email: impl Into<String>) -> Result<(), ValidationError> {
        let email = email.into();
        if !is_valid_email(&email) {
            return Err(ValidationError::InvalidEmail(email));
        }
        self.email = email;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{is_valid_email, PersonProfile, ValidationError};

    #[test]
    fn email_pattern_accepts_common_addresses() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("first.last+tag@sub-domain.example.org"));
    }

    #[test]
    fn email_pattern_rejects_malformed_addresses() {
        for email in ["", "plain", "missing@tld", "@no-local.com", "a b@c.com"] {
            assert!(!is_valid_email(email), "accepted `{email}`");
        }
    }

    #[test]
    fn failed_mutation_keeps_previous_value() {
        let mut profile = PersonProfile::new("Ann", 20, "a@b.com").unwrap();

        assert_eq!(profile.set_age(-1), Err(ValidationError::NegativeAge(-1)));
        assert_eq!(profile.age(), 20);

        let err = profile.set_email("broken").unwrap_err();
        assert_eq!(err, ValidationError::InvalidEmail("broken".to_string()));
        assert_eq!(profile.email(), "a@b.com");
    }
}
