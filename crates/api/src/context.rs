use quillpost_auth::Identity;
use quillpost_core::UserId;

/// Identity context for a request.
///
/// Inserted by the auth gate after the session token verifies; present for all
/// protected routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityContext {
    identity: Identity,
}

impl IdentityContext {
    pub fn new(identity: Identity) -> Self {
        Self { identity }
    }

    pub fn user_id(&self) -> UserId {
        self.identity.id
    }

    pub fn display_name(&self) -> &str {
        &self.identity.display_name
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }
}
