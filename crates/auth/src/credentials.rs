//! Credential policy: password strength and username format.

use thiserror::Error;

use quillpost_core::{DomainError, FieldViolation, Schema};

pub const PASSWORD_MIN_CHARS: usize = 8;
pub const PASSWORD_MAX_CHARS: usize = 32;

pub const USERNAME_MIN_CHARS: usize = 3;
pub const USERNAME_MAX_CHARS: usize = 16;

/// First password rule a secret failed.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PolicyViolation {
    #[error("Password should only be 8-32 characters")]
    PasswordLength,

    #[error("Password should have at least one character, number, and symbol")]
    PasswordCharacters,
}

impl From<PolicyViolation> for DomainError {
    fn from(v: PolicyViolation) -> Self {
        DomainError::validation(v.to_string())
    }
}

/// A symbol is anything outside `[A-Za-z0-9_]`, including non-ASCII characters.
pub fn is_symbol(c: char) -> bool {
    !c.is_ascii_alphanumeric() && c != '_'
}

/// Check a raw secret against the password policy.
///
/// Length is checked first; the character-class rule only runs on secrets of
/// acceptable length.
pub fn validate_password(secret: &str) -> Result<(), PolicyViolation> {
    let len = secret.chars().count();
    if !(PASSWORD_MIN_CHARS..=PASSWORD_MAX_CHARS).contains(&len) {
        return Err(PolicyViolation::PasswordLength);
    }

    let has_letter = secret.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = secret.chars().any(|c| c.is_ascii_digit());
    let has_symbol = secret.chars().any(is_symbol);

    if has_letter && has_digit && has_symbol {
        Ok(())
    } else {
        Err(PolicyViolation::PasswordCharacters)
    }
}

/// Starts with an ASCII letter or `_`, continues with ASCII letters, digits or `_`.
pub fn is_valid_username_pattern(username: &str) -> bool {
    let mut chars = username.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Append the username rules to the field most recently started on `schema`.
pub fn with_username_rules<T: ?Sized>(schema: Schema<T>) -> Schema<T> {
    schema
        .required("User should have a username")
        .min_chars(
            USERNAME_MIN_CHARS,
            "Username should be at least 3 allowed characters",
        )
        .max_chars(
            USERNAME_MAX_CHARS,
            "Username should be at most 16 allowed characters",
        )
        .rule(
            is_valid_username_pattern,
            "Username should only have letters, numbers, or underscores",
        )
}

/// Every username rule that fails, in rule order.
pub fn validate_username(username: &str) -> Vec<FieldViolation> {
    let schema: Schema<str> = with_username_rules(Schema::new().field("username", |s: &str| Some(s)));
    schema.violations(username)
}
