use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use quillpost_auth::{Action, User, authorize_owned};
use quillpost_core::{PostId, UserId};
use quillpost_posts::{Post, PostPatch};

use super::{PostRepository, StoreError, StoreResult, UserRepository};

fn poisoned() -> StoreError {
    StoreError::Backend("in-memory store lock poisoned".to_string())
}

/// In-memory user store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    inner: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl UserRepository for InMemoryUserStore {
    async fn insert(&self, user: User) -> StoreResult<User> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if map.values().any(|u| u.username == user.username) {
            return Err(StoreError::UsernameTaken(user.username));
        }
        map.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.values().find(|u| u.username == username).cloned())
    }

    async fn update_display_name(
        &self,
        id: UserId,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<User> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        let user = map.get_mut(&id).ok_or(StoreError::NotFound("User"))?;
        user.display_name = display_name.to_string();
        user.updated_at = now;
        Ok(user.clone())
    }

    async fn update_password_digest(
        &self,
        id: UserId,
        digest: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        let user = map.get_mut(&id).ok_or(StoreError::NotFound("User"))?;
        user.password_digest = digest.to_string();
        user.updated_at = now;
        Ok(())
    }
}

/// In-memory post store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryPostStore {
    inner: RwLock<HashMap<PostId, Post>>,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn collect(&self, keep: impl Fn(&Post) -> bool) -> StoreResult<Vec<Post>> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        let mut posts: Vec<Post> = map.values().filter(|p| keep(p)).cloned().collect();
        posts.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        Ok(posts)
    }
}

#[async_trait::async_trait]
impl PostRepository for InMemoryPostStore {
    async fn insert(&self, post: Post) -> StoreResult<Post> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        map.insert(post.id, post.clone());
        Ok(post)
    }

    async fn find(&self, id: PostId) -> StoreResult<Option<Post>> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(&id).cloned())
    }

    async fn list_all(&self) -> StoreResult<Vec<Post>> {
        self.collect(|_| true)
    }

    async fn list_by_owner(&self, owner: UserId) -> StoreResult<Vec<Post>> {
        self.collect(|p| p.owner == owner)
    }

    async fn update_owned(
        &self,
        id: PostId,
        requester: UserId,
        patch: &PostPatch,
        now: DateTime<Utc>,
    ) -> StoreResult<Post> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        let post = map.get_mut(&id).ok_or(StoreError::NotFound("Post"))?;
        authorize_owned(&*post, requester, Action::Update)?;
        post.apply(patch, now);
        Ok(post.clone())
    }

    async fn delete_owned(&self, id: PostId, requester: UserId) -> StoreResult<()> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        let post = map.get(&id).ok_or(StoreError::NotFound("Post"))?;
        authorize_owned(post, requester, Action::Delete)?;
        map.remove(&id);
        Ok(())
    }
}
