use serde::{Deserialize, Serialize};

use quillpost_core::UserId;

/// An authenticated principal as recovered from a verified session token.
///
/// `display_name` is whatever the token carried when it was issued; a later
/// rename is only visible after the user logs in again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub display_name: String,
}

impl Identity {
    pub fn new(id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
        }
    }
}
