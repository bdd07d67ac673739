//! OTP-gated pricing routes.
//!
//! Flow: `POST /otp` mails a code, `POST /verify` exchanges it for the
//! `pricing_access` cookie, `GET /` serves pricing while the cookie is valid.

use axum::{
    Json,
    extract::{Query, State},
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{CACHE_CONTROL, SET_COOKIE},
    },
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use mlm_site_core::{Email, Locale, OtpCode};

use crate::content::PricingContent;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::{OptionalVerified, RequireVerified, request_host, set_cookie_value};
use crate::services::generate_otp;
use crate::state::AppState;

const NO_STORE: HeaderValue = HeaderValue::from_static("private, no-store");

const INVALID_CODE: &str = "Incorrect or expired code";

#[derive(Debug, Deserialize)]
pub struct OtpRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct OtpSent {
    pub sent: bool,
    pub expires_in_minutes: u32,
}

/// Mail a one-time code to the visitor.
///
/// POST /api/pricing/otp
///
/// Any previous code for the address stops working.
#[instrument(skip_all)]
pub async fn request_otp(
    State(state): State<AppState>,
    Json(req): Json<OtpRequest>,
) -> Result<impl IntoResponse> {
    let email = Email::parse(&req.email)
        .map_err(|_| AppError::BadRequest("Please enter a valid email address".to_string()))?;
    let ttl_minutes = state.config().pricing.otp_ttl_minutes;

    let otp = generate_otp();
    state.otp_store().store_otp(&email, &otp, ttl_minutes).await?;
    state.mailer().send_otp(&email, &otp, ttl_minutes).await?;

    tracing::info!(email = %email.redacted(), "Pricing OTP issued");

    Ok((
        StatusCode::ACCEPTED,
        Json(OtpSent {
            sent: true,
            expires_in_minutes: ttl_minutes,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub email: String,
    pub otp: String,
}

/// Verification state reported to the browser.
#[derive(Debug, Serialize)]
pub struct AccessStatus {
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
    /// Epoch milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl AccessStatus {
    const fn unverified() -> Self {
        Self {
            verified: false,
            email: None,
            expires_at: None,
        }
    }
}

/// Exchange a code for the pricing cookie.
///
/// POST /api/pricing/verify
#[instrument(skip_all)]
pub async fn verify_otp(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<VerifyRequest>,
) -> Result<impl IntoResponse> {
    let invalid = || AppError::BadRequest(INVALID_CODE.to_string());
    let email = Email::parse(&req.email).map_err(|_| invalid())?;
    let otp = OtpCode::parse(&req.otp).map_err(|_| invalid())?;

    if !state.otp_store().verify_otp(&email, &otp).await? {
        tracing::info!(email = %email.redacted(), "Pricing OTP rejected");
        return Err(invalid());
    }

    let issued = state.tokens().issue(&email)?;
    let cookie = state
        .pricing_cookie()
        .issue(issued.value, request_host(&headers));
    let cookie = set_cookie_value(&cookie)
        .ok_or_else(|| AppError::Internal("pricing cookie is not a valid header".to_string()))?;

    add_breadcrumb("pricing", "Email verified for pricing");
    tracing::info!(email = %email.redacted(), "Pricing access granted");

    Ok((
        [(SET_COOKIE, cookie)],
        Json(AccessStatus {
            verified: true,
            email: Some(issued.payload.email),
            expires_at: Some(issued.payload.expires_at),
        }),
    ))
}

/// Whether the visitor currently has pricing access. Never rejects.
///
/// GET /api/pricing/status
pub async fn status(OptionalVerified(payload): OptionalVerified) -> impl IntoResponse {
    let status = payload.map_or_else(AccessStatus::unverified, |payload| AccessStatus {
        verified: true,
        email: Some(payload.email),
        expires_at: Some(payload.expires_at),
    });
    ([(CACHE_CONTROL, NO_STORE)], Json(status))
}

#[derive(Debug, Deserialize)]
pub struct PricingQuery {
    pub locale: Option<String>,
}

/// Gated pricing content.
///
/// GET /api/pricing?locale=es
#[instrument(skip(state, payload))]
pub async fn show(
    State(state): State<AppState>,
    RequireVerified(payload): RequireVerified,
    Query(query): Query<PricingQuery>,
) -> impl IntoResponse {
    let locale = query
        .locale
        .unwrap_or_else(|| Locale::canonical().code().to_owned());
    tracing::debug!(email = %payload.email.redacted(), %locale, "Serving pricing");
    let pricing: PricingContent = (*state.content().pricing(&locale)).clone();
    ([(CACHE_CONTROL, NO_STORE)], Json(pricing))
}

/// Drop the pricing cookie.
///
/// POST /api/pricing/logout
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let mut response = Json(AccessStatus::unverified()).into_response();
    if let Some(value) = state
        .pricing_cookie()
        .clear_header(request_host(&headers))
    {
        response.headers_mut().insert(SET_COOKIE, value);
    }
    response
}
