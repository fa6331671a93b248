use thiserror::Error;

use quillpost_core::{DomainError, UserId};

/// What a request wants to do with an owned resource.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    Read,
    Update,
    Delete,
}

impl Action {
    pub fn is_mutation(self) -> bool {
        matches!(self, Action::Update | Action::Delete)
    }
}

/// A resource with exactly one owning identity.
pub trait Owned {
    /// Noun used in denial messages, e.g. `"post"`.
    const RESOURCE: &'static str;

    fn owner(&self) -> UserId;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OwnershipError {
    #[error("User cannot edit other users' {0}")]
    CannotEdit(&'static str),

    #[error("User cannot delete other users' {0}")]
    CannotDelete(&'static str),
}

impl From<OwnershipError> for DomainError {
    fn from(err: OwnershipError) -> Self {
        DomainError::authorization(err.to_string())
    }
}

/// Decide whether `requester` may perform `action` on something owned by `owner`.
///
/// - No IO
/// - No panics
/// - Reads are never owner-restricted
pub fn authorize(
    owner: UserId,
    requester: UserId,
    action: Action,
    resource: &'static str,
) -> Result<(), OwnershipError> {
    if !action.is_mutation() || owner == requester {
        return Ok(());
    }

    match action {
        Action::Delete => Err(OwnershipError::CannotDelete(resource)),
        _ => Err(OwnershipError::CannotEdit(resource)),
    }
}

/// [`authorize`] for any [`Owned`] resource.
pub fn authorize_owned<R: Owned>(
    resource: &R,
    requester: UserId,
    action: Action,
) -> Result<(), OwnershipError> {
    authorize(resource.owner(), requester, action, R::RESOURCE)
}
