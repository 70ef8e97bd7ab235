//! User records and email validation

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use sqlx::FromRow;

use super::ValidationError;

/// Maximum length for email addresses (matches the VARCHAR(255) column)
const MAX_EMAIL_LEN: usize = 255;

/// local@domain.tld with no whitespace and at least one dot in the domain
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s.]+(\.[^@\s.]+)+$").expect("invalid email regex")
});

/// User record as stored. The password hash never serializes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct User {
    pub id: i32,
    pub email: String,
    #[serde(skip)]
    #[sqlx(rename = "password")]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Validated email address
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    /// Create an email, validating syntax.
    ///
    /// Surrounding whitespace is trimmed; case is preserved.
    ///
    /// # Example
    /// ```
    /// use postline_server::models::Email;
    ///
    /// assert!(Email::new("a@b.com").is_ok());
    /// assert!(Email::new("not-an-email").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let s = s.trim();

        if s.is_empty() {
            return Err(ValidationError::Empty { field: "email" });
        }

        if s.len() > MAX_EMAIL_LEN {
            return Err(ValidationError::TooLong {
                field: "email",
                max: MAX_EMAIL_LEN,
            });
        }

        if !EMAIL_RE.is_match(s) {
            return Err(ValidationError::InvalidFormat {
                field: "email",
                reason: "must be a valid email address",
            });
        }

        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Registration fields after validation and hashing
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub password_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_emails() {
        assert!(Email::new("a@b.com").is_ok());
        assert!(Email::new("first.last+tag@mail.example.org").is_ok());
        assert_eq!(Email::new("  a@b.com ").unwrap().as_str(), "a@b.com");
    }

    #[test]
    fn rejects_malformed() {
        for bad in ["plain", "a@b", "@b.com", "a@@b.com", "a b@c.com", "a@b..com"] {
            let err = Email::new(bad).unwrap_err();
            assert!(
                matches!(err, ValidationError::InvalidFormat { .. }),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_empty() {
        let err = Email::new("   ").unwrap_err();
        assert!(matches!(err, ValidationError::Empty { .. }));
    }

    #[test]
    fn password_hash_is_not_serialized() {
        let user = User {
            id: 1,
            email: "a@b.com".into(),
            password_hash: "$argon2id$secret".into(),
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["email"], "a@b.com");
        assert!(value.get("password").is_none());
        assert!(value.get("password_hash").is_none());
    }
}
