use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};

use quillpost_auth::{SESSION_TTL_SECS, TokenCodec};
use quillpost_core::DomainError;

use crate::app::errors::ApiError;
use crate::context::IdentityContext;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "jwt";

const NOT_LOGGED_IN: &str = "You are not logged in";
const ALREADY_LOGGED_IN: &str = "You are already logged in";

#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<TokenCodec>,
}

/// Auth gate: verify the session cookie and attach the caller's identity.
pub async fn require_auth(
    State(state): State<AuthState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = session_token(&jar).ok_or_else(|| DomainError::authentication(NOT_LOGGED_IN))?;

    let identity = state.tokens.verify(token).map_err(|e| {
        tracing::debug!(reason = %e, "session token rejected");
        e
    })?;

    req.extensions_mut().insert(IdentityContext::new(identity));

    Ok(next.run(req).await)
}

/// Reject callers that already hold a session cookie. The cookie is not verified.
pub async fn guest_only(jar: CookieJar, req: Request, next: Next) -> Result<Response, ApiError> {
    if session_token(&jar).is_some() {
        return Err(DomainError::authentication(ALREADY_LOGGED_IN).into());
    }
    Ok(next.run(req).await)
}

/// Require a session cookie to be present, without verifying it.
pub async fn require_session_cookie(
    jar: CookieJar,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if session_token(&jar).is_none() {
        return Err(DomainError::authentication(NOT_LOGGED_IN).into());
    }
    Ok(next.run(req).await)
}

/// The session token, unquoted. An empty value counts as absent.
pub fn session_token(jar: &CookieJar) -> Option<&str> {
    jar.get(SESSION_COOKIE)
        .map(Cookie::value_trimmed)
        .filter(|value| !value.is_empty())
}

/// Cookie that stores a freshly issued session token.
pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .path("/")
        .max_age(time::Duration::seconds(SESSION_TTL_SECS))
        .build()
}

/// Cookie used to clear the session on logout.
pub fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}
