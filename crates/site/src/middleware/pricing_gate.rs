//! Pricing gate: the `pricing_access` cookie and its extractors.
//!
//! The cookie carries a signed [`PricingTokenPayload`]. Handlers that serve
//! pricing take [`RequireVerified`]; anything that only needs to know whether
//! the visitor is verified takes [`OptionalVerified`].

use axum::{
    Json,
    extract::FromRequestParts,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{COOKIE, HOST, SET_COOKIE},
        request::Parts,
    },
    response::{IntoResponse, Response},
};
use cookie::{Cookie, SameSite, time::Duration};

use crate::error::ErrorBody;
use crate::services::PricingTokenPayload;
use crate::state::AppState;

/// Name of the pricing access cookie.
pub const PRICING_COOKIE: &str = "pricing_access";

/// Attributes for the pricing access cookie.
#[derive(Debug, Clone)]
pub struct PricingCookie {
    secure: bool,
    max_age_secs: i64,
    fallback_host: Option<String>,
}

impl PricingCookie {
    /// `fallback_host` is used when a request carries no `Host` header.
    #[must_use]
    pub const fn new(secure: bool, max_age_secs: i64, fallback_host: Option<String>) -> Self {
        Self {
            secure,
            max_age_secs,
            fallback_host,
        }
    }

    /// Cookie carrying `token` for a request to `host`.
    #[must_use]
    pub fn issue(&self, token: String, host: Option<&str>) -> Cookie<'static> {
        self.build(token, self.max_age_secs, host)
    }

    /// Empty, already-expired cookie that makes the browser drop the token.
    #[must_use]
    pub fn clear(&self, host: Option<&str>) -> Cookie<'static> {
        self.build(String::new(), 0, host)
    }

    /// [`clear`](Self::clear) rendered as a `Set-Cookie` value.
    #[must_use]
    pub fn clear_header(&self, host: Option<&str>) -> Option<HeaderValue> {
        set_cookie_value(&self.clear(host))
    }

    fn build(&self, value: String, max_age_secs: i64, host: Option<&str>) -> Cookie<'static> {
        let mut builder = Cookie::build((PRICING_COOKIE, value))
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .path("/")
            .max_age(Duration::seconds(max_age_secs));

        if let Some(domain) = host
            .or(self.fallback_host.as_deref())
            .and_then(cookie_domain)
        {
            builder = builder.domain(domain);
        }

        builder.build()
    }
}

/// Cookie `Domain` for a request host, shared with its subdomains.
///
/// The port is dropped. This is not a plain `.{hostname}`: a leading `www.`
/// is also stripped, so `www.example.com` yields `.example.com` and the apex
/// shares the cookie. Other subdomains keep their full name. Local and IP
/// hosts get no domain attribute.
#[must_use]
pub fn cookie_domain(host: &str) -> Option<String> {
    let host = host.trim().to_ascii_lowercase();
    let hostname = match host.strip_prefix('[') {
        // IPv6 literal.
        Some(_) => return None,
        None => host.split(':').next().unwrap_or_default(),
    };

    if hostname.is_empty()
        || hostname == "localhost"
        || hostname.ends_with(".localhost")
        || hostname.parse::<std::net::IpAddr>().is_ok()
    {
        return None;
    }

    let hostname = hostname.strip_prefix("www.").unwrap_or(hostname);
    Some(format!(".{hostname}"))
}

/// Render a cookie as a `Set-Cookie` header value.
#[must_use]
pub fn set_cookie_value(cookie: &Cookie<'_>) -> Option<HeaderValue> {
    HeaderValue::from_str(&cookie.to_string()).ok()
}

/// Host the request was sent to.
#[must_use]
pub fn request_host(headers: &HeaderMap) -> Option<&str> {
    headers.get(HOST).and_then(|v| v.to_str().ok())
}

/// Raw pricing cookie value, if the request carries a non-empty one.
#[must_use]
pub fn pricing_cookie_value(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|c| c.name() == PRICING_COOKIE && !c.value().is_empty())
        .map(|c| c.value().to_owned())
}

/// Claims of a valid pricing token on the request, if any.
///
/// Requests without the cookie are rejected before any signature work.
#[must_use]
pub fn is_verified(state: &AppState, headers: &HeaderMap) -> Option<PricingTokenPayload> {
    let token = pricing_cookie_value(headers)?;
    state.tokens().decode(&token)
}

/// Extractor that requires a valid pricing token.
///
/// Rejects with `401` and a `Set-Cookie` that clears any stale token.
pub struct RequireVerified(pub PricingTokenPayload);

/// Rejection for [`RequireVerified`].
pub struct GateRejection {
    clear_cookie: Option<HeaderValue>,
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        let mut response = (
            StatusCode::UNAUTHORIZED,
            Json(ErrorBody {
                error: "Email verification required".to_string(),
            }),
        )
            .into_response();
        if let Some(value) = self.clear_cookie {
            response.headers_mut().insert(SET_COOKIE, value);
        }
        response
    }
}

impl FromRequestParts<AppState> for RequireVerified {
    type Rejection = GateRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        is_verified(state, &parts.headers)
            .map(Self)
            .ok_or_else(|| GateRejection {
                clear_cookie: state
                    .pricing_cookie()
                    .clear_header(request_host(&parts.headers)),
            })
    }
}

/// Extractor that reports whether the visitor is verified without rejecting.
pub struct OptionalVerified(pub Option<PricingTokenPayload>);

impl FromRequestParts<AppState> for OptionalVerified {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(is_verified(state, &parts.headers)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cookie_settings(secure: bool) -> PricingCookie {
        PricingCookie::new(secure, 1800, Some("www.example-mlm.com".to_string()))
    }

    #[test]
    fn test_cookie_domain() {
        assert_eq!(cookie_domain("example-mlm.com"), Some(".example-mlm.com".to_string()));
        assert_eq!(
            cookie_domain("www.example-mlm.com:443"),
            Some(".example-mlm.com".to_string())
        );
        assert_eq!(
            cookie_domain("app.example-mlm.com"),
            Some(".app.example-mlm.com".to_string())
        );
        assert_eq!(cookie_domain("localhost:3000"), None);
        assert_eq!(cookie_domain("127.0.0.1:3000"), None);
        assert_eq!(cookie_domain("[::1]:3000"), None);
        assert_eq!(cookie_domain(""), None);
    }

    #[test]
    fn test_issue_attributes() {
        let cookie = cookie_settings(true).issue("tok".to_string(), Some("example-mlm.com"));
        assert_eq!(cookie.name(), PRICING_COOKIE);
        assert_eq!(cookie.value(), "tok");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(Duration::seconds(1800)));
        assert_eq!(cookie.domain(), Some("example-mlm.com"));
    }

    #[test]
    fn test_localhost_has_no_domain() {
        let cookie = cookie_settings(false).issue("tok".to_string(), Some("localhost:3000"));
        assert_eq!(cookie.domain(), None);
        let header = set_cookie_value(&cookie).unwrap();
        let header = header.to_str().unwrap();
        assert!(!header.contains("Domain"));
        assert!(!header.contains("Secure"));
    }

    #[test]
    fn test_missing_host_uses_fallback() {
        let cookie = cookie_settings(true).issue("tok".to_string(), None);
        assert_eq!(cookie.domain(), Some("example-mlm.com"));
    }

    #[test]
    fn test_clear_cookie() {
        let header = cookie_settings(true)
            .clear_header(Some("example-mlm.com"))
            .unwrap();
        let header = header.to_str().unwrap();
        assert!(header.starts_with("pricing_access=;"));
        assert!(header.contains("Max-Age=0"));
        assert!(header.contains("HttpOnly"));
    }

    #[test]
    fn test_pricing_cookie_value() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, "theme=dark; pricing_access=abc123".parse().unwrap());
        assert_eq!(pricing_cookie_value(&headers).as_deref(), Some("abc123"));

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, "pricing_access=".parse().unwrap());
        assert_eq!(pricing_cookie_value(&headers), None);

        assert_eq!(pricing_cookie_value(&HeaderMap::new()), None);
    }
}
