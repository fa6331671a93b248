//! Infrastructure layer: storage adapters for users and posts.

pub mod store;

pub use store::{
    InMemoryPostStore, InMemoryUserStore, PgPostStore, PgUserStore, PostRepository, StoreError,
    StoreResult, UserRepository,
};
