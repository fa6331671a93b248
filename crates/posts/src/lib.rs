//! Posts domain module.
//!
//! Business rules for posts, implemented as deterministic domain logic (no IO,
//! no HTTP, no storage).

pub mod post;

pub use post::{NewPost, Post, PostPatch};
