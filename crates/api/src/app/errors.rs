//! Mapping from domain errors to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use quillpost_auth::{OwnershipError, PasswordError, PolicyViolation, TokenError};
use quillpost_core::{DomainError, ErrorKind};
use quillpost_infra::StoreError;

const INTERNAL_MESSAGE: &str = "Internal server error";

/// Handler-boundary error: every failure path ends here.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

pub type ApiResult<T> = Result<T, ApiError>;

macro_rules! into_api_error {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for ApiError {
                fn from(err: $t) -> Self {
                    ApiError(err.into())
                }
            }
        )*
    };
}

into_api_error!(DomainError, StoreError, TokenError, PolicyViolation, PasswordError, OwnershipError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = respond(&self.0);
        (status, Json(body)).into_response()
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation
        | ErrorKind::MissingParameter
        | ErrorKind::MalformedIdentifier
        | ErrorKind::SignatureOrExpiry => StatusCode::BAD_REQUEST,
        ErrorKind::Authentication | ErrorKind::Authorization => StatusCode::UNAUTHORIZED,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Status and JSON body for a domain error.
///
/// Field-level validation failures become an array of `{kind, field, message}`;
/// everything else is a single `{kind, message}`. Internal details are logged,
/// never returned.
pub fn respond(err: &DomainError) -> (StatusCode, Value) {
    let kind = err.kind();
    let status = status_for(kind);

    if kind == ErrorKind::Internal {
        tracing::error!(detail = %err.message(), "internal error");
        return (status, json!({ "kind": kind, "message": INTERNAL_MESSAGE }));
    }

    if err.is_field_list() {
        let items: Vec<Value> = err
            .fields()
            .iter()
            .map(|f| json!({ "kind": kind, "field": f.field, "message": f.message }))
            .collect();
        return (status, Value::Array(items));
    }

    (status, json!({ "kind": kind, "message": err.message() }))
}
