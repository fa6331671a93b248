use axum::{
    routing::{delete, get, post, put},
    Router,
};

pub mod auth;
pub mod posts;
pub mod profile;
pub mod system;

/// Login and signup: only reachable without a session cookie.
pub fn guest_router() -> Router {
    Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
}

/// Logout: needs a session cookie, which is not verified.
pub fn session_router() -> Router {
    Router::new().route("/auth/logout", delete(auth::logout))
}

/// Router for all authenticated endpoints.
pub fn protected_router() -> Router {
    Router::new()
        .nest("/post", posts::router())
        .route("/profile", get(profile::show).put(profile::update))
        .route("/profile/password", put(profile::change_password))
}

/// Endpoints that need no session at all.
pub fn public_router() -> Router {
    Router::new()
        .route("/", get(system::index))
        .route("/ping", get(system::ping))
}
