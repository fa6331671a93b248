use std::sync::Arc;

use axum::{extract::Extension, Json};
use chrono::Utc;
use serde_json::Value;

use quillpost_auth::{Identity, ProfileUpdate, validate_password};
use quillpost_core::DomainError;

use crate::app::dto::{self, ChangePasswordRequest, UpdateProfileRequest};
use crate::app::errors::ApiResult;
use crate::app::extract::JsonBody;
use crate::app::services::AppServices;
use crate::context::IdentityContext;

/// The identity carried by the caller's session token.
pub async fn show(Extension(ctx): Extension<IdentityContext>) -> Json<Identity> {
    Json(ctx.identity().clone())
}

pub async fn update(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<IdentityContext>,
    JsonBody(body): JsonBody<UpdateProfileRequest>,
) -> ApiResult<Json<Value>> {
    let update = ProfileUpdate::from(body);
    update.validate()?;

    match update.display_name() {
        Some(name) => {
            services
                .users
                .update_display_name(ctx.user_id(), name, Utc::now())
                .await?;
        }
        None => {
            services
                .users
                .find_by_id(ctx.user_id())
                .await?
                .ok_or_else(|| DomainError::not_found("User"))?;
        }
    }

    Ok(Json(dto::message("User update successful")))
}

pub async fn change_password(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<IdentityContext>,
    JsonBody(body): JsonBody<ChangePasswordRequest>,
) -> ApiResult<Json<Value>> {
    let password = body
        .password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| DomainError::missing_param("password"))?;
    validate_password(password)?;

    if services.users.find_by_id(ctx.user_id()).await?.is_none() {
        return Err(DomainError::not_found("User").into());
    }

    let digest = services.passwords.hash(password).await?;
    services
        .users
        .update_password_digest(ctx.user_id(), &digest, Utc::now())
        .await?;

    tracing::info!(user_id = %ctx.user_id(), "password changed");
    Ok(Json(dto::message("Password change successful")))
}
