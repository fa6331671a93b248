//! PostgreSQL-backed user and post stores.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Code | StoreError |
//! |------------|-----------------|------------|
//! | Database (unique violation on `users.username`) | `23505` | `UsernameTaken` |
//! | Database (other) | any | `Backend` |
//! | PoolClosed / IO / other | n/a | `Backend` |
//!
//! Conditional post writes lock the row (`SELECT ... FOR UPDATE`) inside a
//! transaction, so the ownership check and the write cannot interleave with
//! another writer.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{FromRow, PgPool, Row};
use tracing::instrument;

use quillpost_auth::{Action, User, authorize_owned};
use quillpost_core::{PostId, UserId};
use quillpost_posts::{Post, PostPatch};

use super::{PostRepository, StoreError, StoreResult, UserRepository};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id              UUID PRIMARY KEY,
        username        TEXT NOT NULL UNIQUE,
        display_name    TEXT NOT NULL,
        password_digest TEXT NOT NULL,
        created_at      TIMESTAMPTZ NOT NULL,
        updated_at      TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS posts (
        id         UUID PRIMARY KEY,
        owner_id   UUID NOT NULL REFERENCES users (id),
        title      TEXT NOT NULL,
        body       TEXT NOT NULL,
        subtitle   TEXT NOT NULL DEFAULT '',
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS posts_owner_created_idx ON posts (owner_id, created_at)",
];

const POST_COLUMNS: &str = "id, owner_id, title, body, subtitle, created_at, updated_at";
const USER_COLUMNS: &str = "id, username, display_name, password_digest, created_at, updated_at";

/// Open a pool and make sure the tables exist.
pub async fn connect(database_url: &str) -> StoreResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .map_err(|e| map_sqlx_error("connect", e))?;
    ensure_schema(&pool).await?;
    Ok(pool)
}

/// Idempotent schema bootstrap.
pub async fn ensure_schema(pool: &PgPool) -> StoreResult<()> {
    for statement in SCHEMA {
        sqlx::query(*statement)
            .execute(pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: Arc<PgPool>,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    async fn fetch_by(&self, column: &str, bind: FetchKey<'_>) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = $1");
        let query = sqlx::query(&sql);
        let query = match bind {
            FetchKey::Id(id) => query.bind(*id.as_uuid()),
            FetchKey::Username(name) => query.bind(name),
        };

        let row = query
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user", e))?;

        row.map(|r| UserRow::from_row(&r).map(User::from))
            .transpose()
            .map_err(|e| map_sqlx_error("decode_user", e))
    }
}

enum FetchKey<'a> {
    Id(UserId),
    Username(&'a str),
}

#[async_trait::async_trait]
impl UserRepository for PgUserStore {
    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn insert(&self, user: User) -> StoreResult<User> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, display_name, password_digest, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(*user.id.as_uuid())
        .bind(&user.username)
        .bind(&user.display_name)
        .bind(&user.password_digest)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| match map_sqlx_error("insert_user", e) {
            StoreError::UsernameTaken(_) => StoreError::UsernameTaken(user.username.clone()),
            other => other,
        })?;

        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        self.fetch_by("id", FetchKey::Id(id)).await
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        self.fetch_by("username", FetchKey::Username(username)).await
    }

    #[instrument(skip(self, display_name), fields(user_id = %id), err)]
    async fn update_display_name(
        &self,
        id: UserId,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<User> {
        let sql = format!(
            "UPDATE users SET display_name = $2, updated_at = $3 WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(*id.as_uuid())
            .bind(display_name)
            .bind(now)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_display_name", e))?
            .ok_or(StoreError::NotFound("User"))?;

        UserRow::from_row(&row)
            .map(User::from)
            .map_err(|e| map_sqlx_error("decode_user", e))
    }

    #[instrument(skip(self, digest), fields(user_id = %id), err)]
    async fn update_password_digest(
        &self,
        id: UserId,
        digest: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        let result = sqlx::query("UPDATE users SET password_digest = $2, updated_at = $3 WHERE id = $1")
            .bind(*id.as_uuid())
            .bind(digest)
            .bind(now)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_password_digest", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("User"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct PgPostStore {
    pool: Arc<PgPool>,
}

impl PgPostStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    async fn lock_for_write(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: PostId,
    ) -> StoreResult<Post> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1 FOR UPDATE");
        let row = sqlx::query(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("lock_post", e))?
            .ok_or(StoreError::NotFound("Post"))?;

        decode_post(&row)
    }

    async fn fetch_list(&self, owner: Option<UserId>) -> StoreResult<Vec<Post>> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE ($1::uuid IS NULL OR owner_id = $1) ORDER BY created_at ASC, id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(owner.map(uuid::Uuid::from))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_posts", e))?;

        rows.iter().map(decode_post).collect()
    }
}

#[async_trait::async_trait]
impl PostRepository for PgPostStore {
    #[instrument(skip(self, post), fields(post_id = %post.id, owner = %post.owner), err)]
    async fn insert(&self, post: Post) -> StoreResult<Post> {
        let sql = format!("INSERT INTO posts ({POST_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7)");
        sqlx::query(&sql)
            .bind(*post.id.as_uuid())
            .bind(*post.owner.as_uuid())
            .bind(&post.title)
            .bind(&post.body)
            .bind(&post.subtitle)
            .bind(post.created_at)
            .bind(post.updated_at)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_post", e))?;

        Ok(post)
    }

    async fn find(&self, id: PostId) -> StoreResult<Option<Post>> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_post", e))?;

        row.as_ref().map(decode_post).transpose()
    }

    async fn list_all(&self) -> StoreResult<Vec<Post>> {
        self.fetch_list(None).await
    }

    async fn list_by_owner(&self, owner: UserId) -> StoreResult<Vec<Post>> {
        self.fetch_list(Some(owner)).await
    }

    #[instrument(skip(self, patch), fields(post_id = %id, requester = %requester), err)]
    async fn update_owned(
        &self,
        id: PostId,
        requester: UserId,
        patch: &PostPatch,
        now: DateTime<Utc>,
    ) -> StoreResult<Post> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin", e))?;

        let mut post = Self::lock_for_write(&mut tx, id).await?;
        authorize_owned(&post, requester, Action::Update)?;
        post.apply(patch, now);

        sqlx::query("UPDATE posts SET title = $2, body = $3, subtitle = $4, updated_at = $5 WHERE id = $1")
            .bind(*post.id.as_uuid())
            .bind(&post.title)
            .bind(&post.body)
            .bind(&post.subtitle)
            .bind(post.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("update_post", e))?;

        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))?;
        Ok(post)
    }

    #[instrument(skip(self), fields(post_id = %id, requester = %requester), err)]
    async fn delete_owned(&self, id: PostId, requester: UserId) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin", e))?;

        let post = Self::lock_for_write(&mut tx, id).await?;
        authorize_owned(&post, requester, Action::Delete)?;

        sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_post", e))?;

        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))?;
        Ok(())
    }
}

// SQLx row types

#[derive(Debug)]
struct UserRow {
    id: uuid::Uuid,
    username: String,
    display_name: String,
    password_digest: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for UserRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(UserRow {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            display_name: row.try_get("display_name")?,
            password_digest: row.try_get("password_digest")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId::from_uuid(row.id),
            username: row.username,
            display_name: row.display_name,
            password_digest: row.password_digest,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug)]
struct PostRow {
    id: uuid::Uuid,
    owner_id: uuid::Uuid,
    title: String,
    body: String,
    subtitle: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for PostRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(PostRow {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            title: row.try_get("title")?,
            body: row.try_get("body")?,
            subtitle: row.try_get("subtitle")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: PostId::from_uuid(row.id),
            owner: UserId::from_uuid(row.owner_id),
            title: row.title,
            body: row.body,
            subtitle: row.subtitle,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn decode_post(row: &PgRow) -> StoreResult<Post> {
    PostRow::from_row(row)
        .map(Post::from)
        .map_err(|e| map_sqlx_error("decode_post", e))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            if is_username_conflict(db_err.code().as_deref(), db_err.constraint()) {
                return StoreError::UsernameTaken(String::new());
            }
            StoreError::Backend(format!("database error in {}: {}", operation, db_err.message()))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}

/// Unique violation (`23505`) on the `users.username` constraint.
fn is_username_conflict(code: Option<&str>, constraint: Option<&str>) -> bool {
    code == Some("23505") && constraint.is_some_and(|c| c.starts_with("users_username"))
}
