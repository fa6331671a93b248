//! User (identity) entity, its signup input and its validation schema.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};

use quillpost_core::{DomainResult, Schema, UserId};

use crate::credentials::with_username_rules;

pub const DISPLAY_NAME_MAX_CHARS: usize = 24;
const DISPLAY_NAME_TOO_LONG: &str = "Name should be at most 24 characters";

/// A registered user.
///
/// `username` and `id` never change after signup; `display_name` and the
/// password digest are the only mutable fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub display_name: String,
    pub password_digest: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Mint a new user from validated signup input and an already-computed digest.
    ///
    /// Without a display name the username is used.
    pub fn register(input: &NewUser, password_digest: String, now: DateTime<Utc>) -> Self {
        let display_name = input
            .display_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&input.username)
            .to_string();

        Self {
            id: UserId::new(),
            username: input.username.clone(),
            display_name,
            password_digest,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Signup input (the password is policy-checked separately).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewUser {
    pub username: String,
    pub display_name: Option<String>,
}

static NEW_USER_SCHEMA: LazyLock<Schema<NewUser>> = LazyLock::new(|| {
    with_username_rules(Schema::new().field("username", |u: &NewUser| Some(u.username.as_str())))
        .field("display_name", |u: &NewUser| u.display_name.as_deref())
        .max_chars(DISPLAY_NAME_MAX_CHARS, DISPLAY_NAME_TOO_LONG)
});

impl NewUser {
    /// All field violations, in schema order.
    pub fn validate(&self) -> DomainResult<()> {
        NEW_USER_SCHEMA.validate(self)
    }
}

/// Profile changes a user may make to themselves. There is deliberately no
/// password here: a profile write can never trigger a re-hash.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
}

static PROFILE_SCHEMA: LazyLock<Schema<ProfileUpdate>> = LazyLock::new(|| {
    Schema::new()
        .field("display_name", |p: &ProfileUpdate| p.display_name.as_deref())
        .max_chars(DISPLAY_NAME_MAX_CHARS, DISPLAY_NAME_TOO_LONG)
});

impl ProfileUpdate {
    pub fn validate(&self) -> DomainResult<()> {
        PROFILE_SCHEMA.validate(self)
    }

    /// The new display name, if one was supplied. Blank names are ignored.
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref().filter(|n| !n.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.display_name().is_none()
    }
}
