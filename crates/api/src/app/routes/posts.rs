use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde_json::Value;

use quillpost_auth::{Action, authorize_owned};
use quillpost_core::{DomainError, PostId, UserId};
use quillpost_posts::{NewPost, Post, PostPatch};

use crate::app::dto::{self, CreatePostRequest, PostCreatedResponse, UpdatePostRequest};
use crate::app::errors::ApiResult;
use crate::app::extract::JsonBody;
use crate::app::services::AppServices;
use crate::context::IdentityContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route("/:id", get(get_post).put(update_post).delete(delete_post))
        .route("/owner/:owner_id", get(list_owner_posts))
}

pub async fn list_posts(
    Extension(services): Extension<Arc<AppServices>>,
) -> ApiResult<Json<Vec<Post>>> {
    Ok(Json(services.posts.list_all().await?))
}

pub async fn list_owner_posts(
    Extension(services): Extension<Arc<AppServices>>,
    Path(owner_id): Path<String>,
) -> ApiResult<Json<Vec<Post>>> {
    let owner: UserId = owner_id.parse()?;
    Ok(Json(services.posts.list_by_owner(owner).await?))
}

pub async fn get_post(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Post>> {
    let id: PostId = id.parse()?;
    Ok(Json(find_post(&services, id).await?))
}

pub async fn create_post(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<IdentityContext>,
    JsonBody(body): JsonBody<CreatePostRequest>,
) -> ApiResult<(StatusCode, Json<PostCreatedResponse>)> {
    let input = NewPost::from(body);
    input.validate()?;

    let post = services
        .posts
        .insert(Post::create(ctx.user_id(), input, Utc::now()))
        .await?;

    tracing::info!(post_id = %post.id, owner = %post.owner, "post created");

    Ok((
        StatusCode::CREATED,
        Json(PostCreatedResponse {
            message: "Post create successful",
            id: post.id,
        }),
    ))
}

pub async fn update_post(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<IdentityContext>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<UpdatePostRequest>,
) -> ApiResult<Json<Value>> {
    let id: PostId = id.parse()?;
    let post = find_post(&services, id).await?;
    authorize_owned(&post, ctx.user_id(), Action::Update)?;

    let patch = PostPatch::from(body);
    patch.validate()?;

    services
        .posts
        .update_owned(id, ctx.user_id(), &patch, Utc::now())
        .await?;

    Ok(Json(dto::message("Post update successful")))
}

pub async fn delete_post(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<IdentityContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id: PostId = id.parse()?;
    let post = find_post(&services, id).await?;
    authorize_owned(&post, ctx.user_id(), Action::Delete)?;

    services.posts.delete_owned(id, ctx.user_id()).await?;

    tracing::info!(post_id = %id, "post deleted");
    Ok(Json(dto::message("Post delete successful")))
}

async fn find_post(services: &AppServices, id: PostId) -> Result<Post, DomainError> {
    services
        .posts
        .find(id)
        .await?
        .ok_or_else(|| DomainError::not_found("Post"))
}
