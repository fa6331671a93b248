use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;

use quillpost_auth::{User, validate_password};
use quillpost_core::DomainError;

use crate::app::dto::{self, LoginRequest, SignupRequest, SignupResponse};
use crate::app::errors::{ApiError, ApiResult};
use crate::app::extract::JsonBody;
use crate::app::services::AppServices;
use crate::middleware::{expired_session_cookie, session_cookie};

const BAD_CREDENTIALS: &str = "Incorrect username/password";

pub async fn signup(
    Extension(services): Extension<Arc<AppServices>>,
    JsonBody(body): JsonBody<SignupRequest>,
) -> ApiResult<(StatusCode, Json<SignupResponse>)> {
    let password = body
        .password()
        .ok_or_else(|| DomainError::missing_param("password"))?;
    validate_password(password)?;

    let input = body.new_user();
    input.validate()?;

    // Cheap early answer; the store still enforces uniqueness on insert.
    if services.users.find_by_username(&input.username).await?.is_some() {
        return Err(quillpost_infra::StoreError::UsernameTaken(input.username).into());
    }

    let digest = services.passwords.hash(password).await?;
    let user = services
        .users
        .insert(User::register(&input, digest, Utc::now()))
        .await?;

    tracing::info!(user_id = %user.id, "user signed up");

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "Sign up successful",
            identity_id: user.id,
            username: user.username,
        }),
    ))
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    jar: CookieJar,
    JsonBody(body): JsonBody<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let username = body.username.unwrap_or_default();
    let password = body.password.unwrap_or_default();

    let Some(user) = services.users.find_by_username(&username).await? else {
        tracing::debug!("login for unknown username");
        return Err(bad_credentials());
    };

    if !services.passwords.verify(&password, &user.password_digest).await {
        tracing::debug!(user_id = %user.id, "login with wrong password");
        return Err(bad_credentials());
    }

    let token = services.tokens.issue(user.id, &user.display_name)?;

    Ok((
        jar.add(session_cookie(token)),
        Json(dto::message("Log-in successful")),
    ))
}

pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (
        jar.remove(expired_session_cookie()),
        Json(dto::message("Logout successful")),
    )
}

fn bad_credentials() -> ApiError {
    DomainError::authentication(BAD_CREDENTIALS).into()
}
