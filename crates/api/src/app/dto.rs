use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use quillpost_auth::{NewUser, ProfileUpdate};
use quillpost_core::{PostId, UserId};
use quillpost_posts::{NewPost, PostPatch};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignupRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(alias = "name")]
    pub display_name: Option<String>,
}

impl SignupRequest {
    /// The supplied password, if non-empty.
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }

    pub fn new_user(&self) -> NewUser {
        NewUser {
            username: self.username.clone().unwrap_or_default(),
            display_name: self.display_name.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreatePostRequest {
    pub title: Option<String>,
    pub body: Option<String>,
    pub subtitle: Option<String>,
}

impl From<CreatePostRequest> for NewPost {
    fn from(req: CreatePostRequest) -> Self {
        NewPost {
            title: req.title.unwrap_or_default(),
            body: req.body.unwrap_or_default(),
            subtitle: req.subtitle,
        }
    }
}

/// Only these keys are writable; anything else in the body (e.g. `owner`) is ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub body: Option<String>,
    pub subtitle: Option<String>,
}

impl From<UpdatePostRequest> for PostPatch {
    fn from(req: UpdatePostRequest) -> Self {
        PostPatch {
            title: req.title,
            body: req.body,
            subtitle: req.subtitle,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateProfileRequest {
    #[serde(alias = "name")]
    pub display_name: Option<String>,
}

impl From<UpdateProfileRequest> for ProfileUpdate {
    fn from(req: UpdateProfileRequest) -> Self {
        ProfileUpdate {
            display_name: req.display_name,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChangePasswordRequest {
    pub password: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub message: &'static str,
    pub identity_id: UserId,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct PostCreatedResponse {
    pub message: &'static str,
    pub id: PostId,
}

pub fn message(text: &str) -> Value {
    json!({ "message": text })
}
