//! Persistence boundary for identities and posts.
//!
//! Handlers only see the traits below; the concrete adapter (in-memory or
//! PostgreSQL) is chosen once at startup.

pub mod in_memory;
pub mod postgres;

use chrono::{DateTime, Utc};
use thiserror::Error;

use quillpost_auth::{OwnershipError, User};
use quillpost_core::{DomainError, FieldViolation, PostId, UserId};
use quillpost_posts::{Post, PostPatch};

pub use in_memory::{InMemoryPostStore, InMemoryUserStore};
pub use postgres::{PgPostStore, PgUserStore};

const USERNAME_TAKEN: &str = "Username is already taken";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("username already taken: {0}")]
    UsernameTaken(String),

    /// Display name of the missing record, e.g. `"Post"`.
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Ownership(#[from] OwnershipError),

    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UsernameTaken(_) => {
                DomainError::invalid_fields(vec![FieldViolation::new("username", USERNAME_TAKEN)])
            }
            StoreError::NotFound(resource) => DomainError::not_found(resource),
            StoreError::Ownership(e) => e.into(),
            StoreError::Backend(detail) => DomainError::internal(detail),
        }
    }
}

#[async_trait::async_trait]
pub trait UserRepository: Send + Sync {
    /// Persist a new user. Fails with `UsernameTaken` if the username exists.
    async fn insert(&self, user: User) -> StoreResult<User>;

    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    async fn update_display_name(
        &self,
        id: UserId,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<User>;

    async fn update_password_digest(
        &self,
        id: UserId,
        digest: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<()>;
}

#[async_trait::async_trait]
pub trait PostRepository: Send + Sync {
    async fn insert(&self, post: Post) -> StoreResult<Post>;

    async fn find(&self, id: PostId) -> StoreResult<Option<Post>>;

    /// All posts, oldest first.
    async fn list_all(&self) -> StoreResult<Vec<Post>>;

    /// Posts owned by `owner`, oldest first. Empty when there are none.
    async fn list_by_owner(&self, owner: UserId) -> StoreResult<Vec<Post>>;

    /// Apply `patch` only if `requester` still owns the post.
    ///
    /// The ownership check and the write happen atomically.
    async fn update_owned(
        &self,
        id: PostId,
        requester: UserId,
        patch: &PostPatch,
        now: DateTime<Utc>,
    ) -> StoreResult<Post>;

    /// Delete the post only if `requester` owns it, atomically.
    async fn delete_owned(&self, id: PostId, requester: UserId) -> StoreResult<()>;
}
