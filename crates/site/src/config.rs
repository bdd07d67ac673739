//! Site configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SITE_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `SITE_BASE_URL` - Public URL for the site (`https://` means production)
//! - `PRICING_TOKEN_SECRET` - HMAC key for pricing access tokens (min 32 chars, high entropy)
//!
//! ## Optional
//! - `SITE_HOST` - Bind address (default: 127.0.0.1)
//! - `SITE_PORT` - Listen port (default: 3000)
//! - `SITE_NAME` - Name used in OTP emails (default: MLM Software)
//! - `SITE_CONTENT_DIR` - Directory holding `locales/` overrides (default: crates/site/content)
//! - `PRICING_TOKEN_MAX_AGE_MINUTES` - Pricing access window (default: 30, min 1)
//! - `OTP_TTL_MINUTES` - OTP lifetime (default: 10, min 1)
//! - `OTP_SWEEP_INTERVAL_SECS` - Expired OTP sweep interval (default: 300, min 1)
//! - `CONTENT_CACHE_CAPACITY` - Cached locale strings per feature (default: 1024)
//! - `CONTENT_CACHE_TTL_SECS` - Cache entry lifetime (default: no expiry)
//! - `SMTP_HOST`, `SMTP_PORT`, `SMTP_USERNAME`, `SMTP_PASSWORD`, `MAIL_FROM` -
//!   OTP mail delivery. All or none; required in production.
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::content::CacheSettings;

const MIN_TOKEN_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Site application configuration.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the site
    pub base_url: String,
    /// Name shown in OTP emails
    pub site_name: String,
    /// Directory holding locale override files
    pub content_dir: PathBuf,
    /// Merged-content cache bounds
    pub content_cache: CacheSettings,
    /// Pricing gate settings
    pub pricing: PricingConfig,
    /// SMTP settings; `None` logs codes instead of mailing them
    pub email: Option<EmailConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Pricing gate configuration.
///
/// Implements `Debug` manually to redact the signing key.
#[derive(Clone)]
pub struct PricingConfig {
    /// HMAC-SHA256 key for pricing access tokens
    pub token_secret: SecretString,
    /// Token and cookie lifetime in minutes
    pub token_max_age_minutes: u32,
    /// OTP lifetime in minutes
    pub otp_ttl_minutes: u32,
    /// Interval between expired OTP sweeps
    pub otp_sweep_interval: Duration,
}

impl std::fmt::Debug for PricingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PricingConfig")
            .field("token_secret", &"[REDACTED]")
            .field("token_max_age_minutes", &self.token_max_age_minutes)
            .field("otp_ttl_minutes", &self.otp_ttl_minutes)
            .field("otp_sweep_interval", &self.otp_sweep_interval)
            .finish()
    }
}

/// SMTP configuration for OTP mail.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: SecretString,
    pub from_address: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .finish()
    }
}

impl SiteConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("SITE_DATABASE_URL")?;
        let host = parse_env("SITE_HOST", "127.0.0.1")?;
        let port = parse_env("SITE_PORT", "3000")?;
        let base_url = get_required_env("SITE_BASE_URL")?;
        url::Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("SITE_BASE_URL".to_string(), e.to_string()))?;
        let site_name = get_env_or_default("SITE_NAME", "MLM Software");
        let content_dir = PathBuf::from(get_env_or_default(
            "SITE_CONTENT_DIR",
            "crates/site/content",
        ));

        let content_cache = CacheSettings {
            capacity: parse_env("CONTENT_CACHE_CAPACITY", "1024")?,
            ttl: get_optional_env("CONTENT_CACHE_TTL_SECS")
                .map(|v| {
                    v.parse::<u64>().map(Duration::from_secs).map_err(|e| {
                        ConfigError::InvalidEnvVar(
                            "CONTENT_CACHE_TTL_SECS".to_string(),
                            e.to_string(),
                        )
                    })
                })
                .transpose()?,
        };

        let pricing = PricingConfig::from_env()?;
        let email = EmailConfig::from_env()?;

        let config = Self {
            database_url,
            host,
            port,
            base_url,
            site_name,
            content_dir,
            content_cache,
            pricing,
            email,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        };

        if config.is_production() && config.email.is_none() {
            return Err(ConfigError::MissingEnvVar("SMTP_HOST".to_string()));
        }

        Ok(config)
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Production deployments serve over HTTPS.
    #[must_use]
    pub fn is_production(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Host name of the public base URL.
    #[must_use]
    pub fn base_host(&self) -> Option<String> {
        url::Url::parse(&self.base_url)
            .ok()?
            .host_str()
            .map(str::to_owned)
    }
}

impl PricingConfig {
    /// Load the pricing gate settings on their own.
    ///
    /// # Errors
    ///
    /// Returns error if the token secret is missing or weak, or a lifetime
    /// or interval fails to parse or is zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        let token_secret = get_validated_secret("PRICING_TOKEN_SECRET")?;
        validate_token_secret(&token_secret, "PRICING_TOKEN_SECRET")?;

        Ok(Self {
            token_secret,
            token_max_age_minutes: parse_nonzero_env("PRICING_TOKEN_MAX_AGE_MINUTES", "30")?,
            otp_ttl_minutes: parse_nonzero_env("OTP_TTL_MINUTES", "10")?,
            otp_sweep_interval: Duration::from_secs(parse_nonzero_env(
                "OTP_SWEEP_INTERVAL_SECS",
                "300",
            )?),
        })
    }
}

impl EmailConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(smtp_host) = get_optional_env("SMTP_HOST") else {
            return Ok(None);
        };

        Ok(Some(Self {
            smtp_host,
            smtp_port: parse_env("SMTP_PORT", "587")?,
            smtp_username: get_required_env("SMTP_USERNAME")?,
            smtp_password: get_required_secret("SMTP_PASSWORD")?,
            from_address: get_required_env("MAIL_FROM")?,
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse an environment variable that must not be zero.
fn parse_nonzero_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr + Default + PartialEq,
    T::Err: std::fmt::Display,
{
    parse_nonzero(key, &get_env_or_default(key, default))
}

fn parse_nonzero<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr + Default + PartialEq,
    T::Err: std::fmt::Display,
{
    let value = raw
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if value == T::default() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be at least 1".to_string(),
        ));
    }
    Ok(value)
}

/// Validate that the token secret meets minimum length requirements.
fn validate_token_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_TOKEN_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_TOKEN_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
