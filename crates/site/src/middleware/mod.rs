//! HTTP middleware stack for the site.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (nosniff, frame denial, HSTS in production)
//! 5. Rate limiting (governor, per route group)
//!
//! The pricing gate is an extractor rather than a layer, so each handler
//! states whether it needs a verified visitor.

pub mod pricing_gate;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use pricing_gate::{
    OptionalVerified, PRICING_COOKIE, PricingCookie, RequireVerified, is_verified,
    pricing_cookie_value, request_host, set_cookie_value,
};
pub use rate_limit::{api_rate_limiter, otp_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
