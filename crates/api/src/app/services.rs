use std::sync::Arc;

use thiserror::Error;

use quillpost_auth::{PasswordError, PasswordStore, TokenCodec};
use quillpost_infra::{
    InMemoryPostStore, InMemoryUserStore, PgPostStore, PgUserStore, PostRepository, StoreError,
    UserRepository, store::postgres,
};

use crate::config::AppConfig;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("invalid password hash cost: {0}")]
    HashCost(#[from] PasswordError),

    #[error("storage unavailable: {0}")]
    Store(#[from] StoreError),
}

/// Shared, read-only request dependencies.
#[derive(Clone)]
pub struct AppServices {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub passwords: PasswordStore,
    pub tokens: Arc<TokenCodec>,
}

pub async fn build_services(config: &AppConfig) -> Result<AppServices, BootstrapError> {
    let passwords = PasswordStore::new(config.hash_cost)?;
    let tokens = Arc::new(TokenCodec::new(config.jwt_secret.as_bytes()));

    let (users, posts): (Arc<dyn UserRepository>, Arc<dyn PostRepository>) =
        match &config.database_url {
            Some(url) => {
                let pool = postgres::connect(url).await?;
                tracing::info!("using PostgreSQL storage");
                (
                    Arc::new(PgUserStore::new(pool.clone())),
                    Arc::new(PgPostStore::new(pool)),
                )
            }
            None => {
                tracing::info!("DATABASE_URL not set; using in-memory storage");
                (
                    Arc::new(InMemoryUserStore::new()),
                    Arc::new(InMemoryPostStore::new()),
                )
            }
        };

    Ok(AppServices {
        users,
        posts,
        passwords,
        tokens,
    })
}
