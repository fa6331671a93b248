use axum::{
    extract::OriginalUri,
    http::{Method, StatusCode},
    response::Redirect,
    Json,
};
use serde_json::Value;

use crate::app::dto;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn index() -> Redirect {
    Redirect::to("/api/ping")
}

pub async fn ping() -> Json<Value> {
    Json(dto::message("pong"))
}

pub async fn not_found(method: Method, OriginalUri(uri): OriginalUri) -> (StatusCode, Json<Value>) {
    let target = uri.path_and_query().map_or(uri.path(), |pq| pq.as_str());
    (
        StatusCode::NOT_FOUND,
        Json(dto::message(&format!("{method} {target} not found"))),
    )
}
