//! HTTP route handlers for the site.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness
//! GET  /health/ready                    - Readiness (OTP store reachable)
//!
//! # Content (public, rate limited)
//! GET  /api/content/{locale}/{feature}  - Merged content bundle
//! GET  /api/locales                     - Supported locales
//! GET  /api/paths/{locale}              - Translated URL for every page
//! GET  /api/resolve?path=               - Resolve a localized path
//!
//! # Pricing gate
//! POST /api/pricing/otp                 - Mail a one-time code (strict rate limit)
//! POST /api/pricing/verify              - Exchange code for cookie (strict rate limit)
//! GET  /api/pricing/status              - {verified, email?}
//! GET  /api/pricing?locale=             - Pricing bundle (requires cookie)
//! POST /api/pricing/logout              - Clear cookie
//! ```

pub mod content;
pub mod pricing;

use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::middleware::{
    api_rate_limiter, otp_rate_limiter, request_id_middleware, security_headers_middleware,
};
use crate::state::AppState;

/// Create the public content routes router.
pub fn content_routes() -> Router<AppState> {
    Router::new()
        .route("/api/content/{locale}/{feature}", get(content::show))
        .route("/api/locales", get(content::locales))
        .route("/api/paths/{locale}", get(content::paths))
        .route("/api/resolve", get(content::resolve))
        .layer(api_rate_limiter())
}

/// Create the pricing gate routes router.
pub fn pricing_routes() -> Router<AppState> {
    let otp = Router::new()
        .route("/api/pricing/otp", post(pricing::request_otp))
        .route("/api/pricing/verify", post(pricing::verify_otp))
        .layer(otp_rate_limiter());

    Router::new()
        .route("/api/pricing", get(pricing::show))
        .route("/api/pricing/status", get(pricing::status))
        .route("/api/pricing/logout", post(pricing::logout))
        .merge(otp)
}

/// Create all routes with the shared middleware stack.
///
/// Sentry layers are added by the binary so tests can drive this router
/// without a Sentry client.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(content_routes())
        .merge(pricing_routes())
        .layer(from_fn_with_state(
            state.clone(),
            security_headers_middleware,
        ))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the OTP store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.otp_store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
