//! Integration tests for the OTP-gated pricing flow.
//!
//! Run with: cargo test -p mlm-site-integration-tests

#![allow(clippy::unwrap_used)]

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::{TimeDelta, Utc};
use secrecy::SecretString;
use serde_json::json;

use mlm_site_core::Email;
use mlm_site_integration_tests::{
    TEST_HOST, TEST_TOKEN_SECRET, TestApp, body_json, cookie_pair, request, set_cookie,
};
use mlm_site_web::middleware::PRICING_COOKIE;
use mlm_site_web::services::PricingTokenSigner;

const VISITOR: &str = "visitor@example.com";

fn assert_clears_cookie(set_cookie: Option<String>) {
    let set_cookie = set_cookie.expect("response clears the pricing cookie");
    assert!(set_cookie.starts_with("pricing_access=;"), "{set_cookie}");
    assert!(set_cookie.contains("Max-Age=0"), "{set_cookie}");
}

// ============================================================================
// Full Flow
// ============================================================================

#[tokio::test]
async fn test_otp_verify_then_pricing() {
    let app = TestApp::new();

    let response = app
        .post_json("/api/pricing/otp", &json!({ "email": "Visitor@Example.com" }))
        .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = body_json(response).await;
    assert_eq!(body["sent"], true);
    assert_eq!(body["expires_in_minutes"], 10);
    assert_eq!(app.mailer.sent_count(), 1);
    assert_eq!(app.store.len().await, 1);

    let code = app.mailed_code(VISITOR).expect("code mailed to normalized address");
    let response = app
        .post_json(
            "/api/pricing/verify",
            &json!({ "email": VISITOR, "otp": code.as_str() }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let raw_cookie = set_cookie(&response).expect("verify sets the pricing cookie");
    assert!(raw_cookie.starts_with("pricing_access="));
    assert!(raw_cookie.contains("HttpOnly"));
    assert!(raw_cookie.contains("Secure"));
    assert!(raw_cookie.contains("SameSite=Lax"));
    assert!(raw_cookie.contains("Path=/"));
    assert!(raw_cookie.contains("Max-Age=1800"));
    assert!(raw_cookie.contains("Domain="));
    assert!(raw_cookie.contains("example-mlm.com"));
    assert!(!raw_cookie.contains("www."));

    let body = body_json(response).await;
    assert_eq!(body["verified"], true);
    assert_eq!(body["email"], VISITOR);
    assert!(body["expires_at"].as_i64().unwrap_or_default() > Utc::now().timestamp_millis());

    // Code is consumed.
    assert_eq!(app.store.len().await, 0);

    let cookie = cookie_pair(&raw_cookie).to_owned();
    let response = app.get("/api/pricing", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "private, no-store"
    );
    let body = body_json(response).await;
    assert_eq!(body["hero"]["title"], "Pricing");
    assert!(!body["tiers"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_localized_pricing_keeps_support_channels() {
    let app = TestApp::new();
    let cookie = app.verified_cookie(VISITOR).await;

    let response = app.get("/api/pricing?locale=es", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    assert_eq!(body["hero"]["title"], "Precios");
    // Override only names `chat`; the other channels come from the defaults.
    assert_eq!(
        body["support"]["channels"]["chat"],
        "Chat en vivo, días laborables 9:00-18:00 UTC"
    );
    assert_eq!(body["support"]["channels"]["email"], "sales@example.com");
    assert_eq!(body["support"]["channels"]["phone"], "+1 555 010 0199");
    // Tiers are not overridden for Spanish.
    assert!(!body["tiers"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_pricing_not_served_by_public_content_route() {
    let app = TestApp::new();
    let cookie = app.verified_cookie(VISITOR).await;

    let response = app.get("/api/content/en/pricing", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Code Verification
// ============================================================================

#[tokio::test]
async fn test_invalid_email_rejected() {
    let app = TestApp::new();

    let response = app
        .post_json("/api/pricing/otp", &json!({ "email": "not-an-email" }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Please enter a valid email address");
    assert_eq!(app.mailer.sent_count(), 0);
}

#[tokio::test]
async fn test_wrong_code_rejected_without_cookie() {
    let app = TestApp::new();
    app.post_json("/api/pricing/otp", &json!({ "email": VISITOR }))
        .await;

    let code = app.mailed_code(VISITOR).unwrap();
    let wrong = if code.as_str() == "000000" { "111111" } else { "000000" };

    let response = app
        .post_json("/api/pricing/verify", &json!({ "email": VISITOR, "otp": wrong }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(set_cookie(&response).is_none());
    let body = body_json(response).await;
    assert_eq!(body["error"], "Incorrect or expired code");
}

#[tokio::test]
async fn test_code_is_single_use() {
    let app = TestApp::new();
    app.post_json("/api/pricing/otp", &json!({ "email": VISITOR }))
        .await;
    let code = app.mailed_code(VISITOR).unwrap();
    let body = json!({ "email": VISITOR, "otp": code.as_str() });

    let first = app.post_json("/api/pricing/verify", &body).await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = app.post_json("/api/pricing/verify", &body).await;
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_code_for_other_email_rejected() {
    let app = TestApp::new();
    app.post_json("/api/pricing/otp", &json!({ "email": VISITOR }))
        .await;
    let code = app.mailed_code(VISITOR).unwrap();

    let response = app
        .post_json(
            "/api/pricing/verify",
            &json!({ "email": "someone-else@example.com", "otp": code.as_str() }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_code_rejected() {
    let app = TestApp::new();

    let response = app
        .post_json("/api/pricing/verify", &json!({ "email": VISITOR, "otp": "12ab" }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Gate Rejections
// ============================================================================

#[tokio::test]
async fn test_pricing_without_cookie_is_unauthorized() {
    let app = TestApp::new();

    let response = app.get("/api/pricing", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_clears_cookie(set_cookie(&response));
    let body = body_json(response).await;
    assert_eq!(body["error"], "Email verification required");
}

#[tokio::test]
async fn test_garbage_cookie_is_unauthorized() {
    let app = TestApp::new();

    let response = app
        .get("/api/pricing", Some("pricing_access=not-a-token"))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_clears_cookie(set_cookie(&response));
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_unauthorized() {
    let app = TestApp::new();
    let signer = PricingTokenSigner::new(
        SecretString::from("Zq8WmT3vLx6RkP1sNy4HbG7cJd2FuA9e"),
        30,
    );
    let token = signer.issue(&Email::parse(VISITOR).unwrap()).unwrap();

    let cookie = format!("{PRICING_COOKIE}={}", token.value);
    let response = app.get("/api/pricing", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_is_unauthorized() {
    let app = TestApp::new();
    let signer = PricingTokenSigner::new(SecretString::from(TEST_TOKEN_SECRET), 30);
    let issued_at = Utc::now() - TimeDelta::minutes(31);
    let token = signer
        .issue_at(&Email::parse(VISITOR).unwrap(), issued_at)
        .unwrap();

    let cookie = format!("{PRICING_COOKIE}={}", token.value);
    let response = app.get("/api/pricing", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_clears_cookie(set_cookie(&response));
}

#[tokio::test]
async fn test_token_issued_elsewhere_with_shared_secret_is_accepted() {
    let app = TestApp::new();
    let signer = PricingTokenSigner::new(SecretString::from(TEST_TOKEN_SECRET), 30);
    let token = signer.issue(&Email::parse(VISITOR).unwrap()).unwrap();

    let cookie = format!("{PRICING_COOKIE}={}", token.value);
    let response = app.get("/api/pricing", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ============================================================================
// Status & Logout
// ============================================================================

#[tokio::test]
async fn test_status_reports_verification() {
    let app = TestApp::new();

    let response = app.get("/api/pricing/status", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body, json!({ "verified": false }));

    let cookie = app.verified_cookie(VISITOR).await;
    let response = app.get("/api/pricing/status", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["verified"], true);
    assert_eq!(body["email"], VISITOR);
}

#[tokio::test]
async fn test_status_never_rejects_bad_cookie() {
    let app = TestApp::new();

    let response = app
        .get("/api/pricing/status", Some("pricing_access=garbage"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookie(&response).is_none());
    let body = body_json(response).await;
    assert_eq!(body["verified"], false);
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let app = TestApp::new();

    let response = app
        .send(
            request("POST", "/api/pricing/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_clears_cookie(set_cookie(&response));
    let body = body_json(response).await;
    assert_eq!(body["verified"], false);
}

// ============================================================================
// Rate Limiting
// ============================================================================

#[tokio::test]
async fn test_otp_requests_are_rate_limited_per_client() {
    let app = TestApp::new();
    let body = json!({ "email": VISITOR });

    for _ in 0..5 {
        let response = app.post_json("/api/pricing/otp", &body).await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    let response = app.post_json("/api/pricing/otp", &body).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    // Another client is unaffected.
    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/api/pricing/otp")
                .header(header::HOST, TEST_HOST)
                .header("x-forwarded-for", "198.51.100.20")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
}
