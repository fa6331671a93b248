use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use quillpost_auth::Owned;
use quillpost_core::{DomainResult, PostId, Schema, UserId};

pub const SUBTITLE_MAX_CHARS: usize = 80;

const TITLE_REQUIRED: &str = "Post should have a title";
const BODY_REQUIRED: &str = "Post should have a body";
const SUBTITLE_TOO_LONG: &str = "Subtitle should be at most 80 characters";

/// A text post. The owner is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub owner: UserId,
    pub title: String,
    pub body: String,
    pub subtitle: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Owned for Post {
    const RESOURCE: &'static str = "post";

    fn owner(&self) -> UserId {
        self.owner
    }
}

impl Post {
    /// Build a post owned by `owner` from already-validated input.
    pub fn create(owner: UserId, input: NewPost, now: DateTime<Utc>) -> Self {
        Self {
            id: PostId::new(),
            owner,
            title: input.title,
            body: input.body,
            subtitle: input.subtitle.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply the supplied fields of `patch`. Ownership is untouched.
    pub fn apply(&mut self, patch: &PostPatch, now: DateTime<Utc>) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(body) = &patch.body {
            self.body = body.clone();
        }
        if let Some(subtitle) = &patch.subtitle {
            self.subtitle = subtitle.clone();
        }
        self.updated_at = now;
    }
}

/// Input for creating a post.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewPost {
    pub title: String,
    pub body: String,
    pub subtitle: Option<String>,
}

static NEW_POST_SCHEMA: LazyLock<Schema<NewPost>> = LazyLock::new(|| {
    Schema::new()
        .field("title", |p: &NewPost| Some(p.title.as_str()))
        .required(TITLE_REQUIRED)
        .field("body", |p: &NewPost| Some(p.body.as_str()))
        .required(BODY_REQUIRED)
        .field("subtitle", |p: &NewPost| p.subtitle.as_deref())
        .max_chars(SUBTITLE_MAX_CHARS, SUBTITLE_TOO_LONG)
});

impl NewPost {
    pub fn validate(&self) -> DomainResult<()> {
        NEW_POST_SCHEMA.validate(self)
    }
}

/// Partial update of a post: only `Some` fields are validated and written.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PostPatch {
    pub title: Option<String>,
    pub body: Option<String>,
    pub subtitle: Option<String>,
}

static PATCH_SCHEMA: LazyLock<Schema<PostPatch>> = LazyLock::new(|| {
    Schema::new()
        .field("title", |p: &PostPatch| p.title.as_deref())
        .not_blank(TITLE_REQUIRED)
        .field("body", |p: &PostPatch| p.body.as_deref())
        .not_blank(BODY_REQUIRED)
        .field("subtitle", |p: &PostPatch| p.subtitle.as_deref())
        .max_chars(SUBTITLE_MAX_CHARS, SUBTITLE_TOO_LONG)
});

impl PostPatch {
    pub fn validate(&self) -> DomainResult<()> {
        PATCH_SCHEMA.validate(self)
    }
}
