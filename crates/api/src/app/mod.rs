//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: storage, password store and token codec wiring
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs
//! - `extract.rs`: JSON body extractor
//! - `errors.rs`: domain error to response mapping

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Request,
    middleware::{from_fn, from_fn_with_state},
    response::Response,
    routing::get,
    Extension, Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::config::AppConfig;
use crate::middleware::{self, AuthState};

pub mod dto;
pub mod errors;
pub mod extract;
pub mod routes;
pub mod services;

pub use services::{AppServices, BootstrapError};

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: &AppConfig) -> Result<Router, BootstrapError> {
    let services = services::build_services(config).await?;
    Ok(router(services))
}

/// Router over already-built services.
pub fn router(services: AppServices) -> Router {
    let auth_state = AuthState {
        tokens: services.tokens.clone(),
    };

    let guest = routes::guest_router().route_layer(from_fn(middleware::guest_only));
    let session = routes::session_router().route_layer(from_fn(middleware::require_session_cookie));
    let protected = routes::protected_router()
        .route_layer(from_fn_with_state(auth_state, middleware::require_auth));

    let api = routes::public_router()
        .merge(guest)
        .merge(session)
        .merge(protected);

    // Unknown paths and known paths with the wrong method share the 404 handler.
    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api", api)
        .fallback(routes::system::not_found)
        .method_not_allowed_fallback(routes::system::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(|req: &Request| {
                            tracing::info_span!(
                                "http_request",
                                method = %req.method(),
                                path = %req.uri().path(),
                            )
                        })
                        .on_response(|res: &Response, latency: Duration, _span: &Span| {
                            tracing::info!(
                                status = res.status().as_u16(),
                                latency_ms = latency.as_millis() as u64,
                                "request"
                            );
                        }),
                )
                .layer(Extension(Arc::new(services))),
        )
}
