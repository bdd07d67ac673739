//! Integration tests for the MLM marketing site.
//!
//! Tests drive the full router in-process: the shipped content directory,
//! the real middleware stack, an in-memory OTP store and a mailer that
//! records codes instead of sending them. No database or SMTP server is
//! needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p mlm-site-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `content_api` - Localized content, locales and path resolution
//! - `pricing_gate` - OTP request, verification, cookie and gated pricing
//! - `site_health` - Health checks and response headers

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use http_body_util::BodyExt;
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use mlm_site_core::{Email, OtpCode};
use mlm_site_web::config::{PricingConfig, SiteConfig};
use mlm_site_web::content::{CacheSettings, ContentResolver};
use mlm_site_web::routes;
use mlm_site_web::services::{MemoryOtpStore, RecordingMailer};
use mlm_site_web::state::AppState;

/// Host the test requests are addressed to.
pub const TEST_HOST: &str = "www.example-mlm.com";

/// Client address used as the rate-limit key.
pub const TEST_CLIENT_IP: &str = "203.0.113.7";

/// Secret shared by the test server and tests that forge tokens.
pub const TEST_TOKEN_SECRET: &str = "k3Jx9QpLm2vZt8WnRb5YcHf4GsD7aE1u";

/// Shipped content directory of the site crate.
#[must_use]
pub fn content_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../site/content")
}

/// Production-like configuration with no database or SMTP.
#[must_use]
pub fn test_config() -> SiteConfig {
    SiteConfig {
        database_url: SecretString::from("postgres://localhost/mlm_site_test"),
        host: std::net::IpAddr::from([127, 0, 0, 1]),
        port: 3000,
        base_url: format!("https://{TEST_HOST}"),
        site_name: "MLM Software".to_string(),
        content_dir: content_dir(),
        content_cache: CacheSettings::default(),
        pricing: PricingConfig {
            token_secret: SecretString::from(TEST_TOKEN_SECRET),
            token_max_age_minutes: 30,
            otp_ttl_minutes: 10,
            otp_sweep_interval: Duration::from_secs(300),
        },
        email: None,
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// A site instance wired to in-memory collaborators.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryOtpStore>,
    pub mailer: Arc<RecordingMailer>,
}

impl TestApp {
    /// Build the app from [`test_config`].
    ///
    /// # Panics
    ///
    /// Panics if the shipped content fails to load.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    /// Build the app from `config`.
    ///
    /// # Panics
    ///
    /// Panics if the content directory fails to load.
    #[must_use]
    pub fn with_config(config: SiteConfig) -> Self {
        let content = ContentResolver::load(&config.content_dir, config.content_cache)
            .expect("shipped content loads");
        let store = Arc::new(MemoryOtpStore::new());
        let mailer = Arc::new(RecordingMailer::new());

        let state = AppState::new(config, content, store.clone(), mailer.clone());

        Self {
            router: routes::app(state.clone()),
            state,
            store,
            mailer,
        }
    }

    /// Send a request through the full middleware stack.
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        match self.router.clone().oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        }
    }

    /// `GET uri` with an optional `Cookie` header.
    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = request("GET", uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).expect("valid request"))
            .await
    }

    /// `POST uri` with a JSON body.
    pub async fn post_json(&self, uri: &str, body: &Value) -> Response<Body> {
        let request = request("POST", uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("valid request");
        self.send(request).await
    }

    /// Code most recently mailed to `email`.
    #[must_use]
    pub fn mailed_code(&self, email: &str) -> Option<OtpCode> {
        let email = Email::parse(email).ok()?;
        self.mailer.last_code_for(&email)
    }

    /// Run the OTP flow for `email` and return the `name=value` cookie pair.
    ///
    /// # Panics
    ///
    /// Panics if any step of the flow fails.
    pub async fn verified_cookie(&self, email: &str) -> String {
        let response = self
            .post_json("/api/pricing/otp", &serde_json::json!({ "email": email }))
            .await;
        assert_eq!(response.status(), 202, "OTP request failed");

        let code = self.mailed_code(email).expect("code was mailed");
        let response = self
            .post_json(
                "/api/pricing/verify",
                &serde_json::json!({ "email": email, "otp": code.as_str() }),
            )
            .await;
        assert_eq!(response.status(), 200, "OTP verification failed");

        let set_cookie = set_cookie(&response).expect("verify sets the pricing cookie");
        cookie_pair(&set_cookie).to_owned()
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Request builder carrying the test host and client address.
#[must_use]
pub fn request(method: &str, uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::HOST, TEST_HOST)
        .header("x-forwarded-for", TEST_CLIENT_IP)
}

/// Collect a response body as JSON.
///
/// # Panics
///
/// Panics if the body is not valid JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body collects")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body is JSON")
}

/// `Set-Cookie` header of a response.
#[must_use]
pub fn set_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

/// `name=value` part of a `Set-Cookie` header.
#[must_use]
pub fn cookie_pair(set_cookie: &str) -> &str {
    set_cookie.split(';').next().unwrap_or_default().trim()
}
