//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: token service, stores, gate and session flow
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs and extractors
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use workdesk_auth::PermissionError;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: Arc<AppServices>) -> Result<Router, PermissionError> {
    let protected = routes::router(&services.gate)?;

    Ok(Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .fallback(errors::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::map_response(errors::ensure_error_envelope))
                .layer(Extension(services)),
        ))
}
