//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::SiteConfig;
use crate::content::ContentResolver;
use crate::middleware::PricingCookie;
use crate::services::{OtpMailer, OtpStore, PricingTokenSigner};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the OTP store and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: SiteConfig,
    content: ContentResolver,
    otp_store: Arc<dyn OtpStore>,
    mailer: Arc<dyn OtpMailer>,
    tokens: PricingTokenSigner,
    cookie: PricingCookie,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The token signer and cookie settings are derived from `config`.
    #[must_use]
    pub fn new(
        config: SiteConfig,
        content: ContentResolver,
        otp_store: Arc<dyn OtpStore>,
        mailer: Arc<dyn OtpMailer>,
    ) -> Self {
        let tokens = PricingTokenSigner::new(
            config.pricing.token_secret.clone(),
            config.pricing.token_max_age_minutes,
        );
        let cookie = PricingCookie::new(
            config.is_production(),
            tokens.max_age_secs(),
            config.base_host(),
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                content,
                otp_store,
                mailer,
                tokens,
                cookie,
            }),
        }
    }

    /// Get a reference to the site configuration.
    #[must_use]
    pub fn config(&self) -> &SiteConfig {
        &self.inner.config
    }

    /// Get a reference to the content resolver.
    #[must_use]
    pub fn content(&self) -> &ContentResolver {
        &self.inner.content
    }

    /// Get a reference to the OTP store.
    #[must_use]
    pub fn otp_store(&self) -> &dyn OtpStore {
        self.inner.otp_store.as_ref()
    }

    /// A shared handle to the OTP store, for background tasks.
    #[must_use]
    pub fn otp_store_handle(&self) -> Arc<dyn OtpStore> {
        Arc::clone(&self.inner.otp_store)
    }

    /// Get a reference to the OTP mailer.
    #[must_use]
    pub fn mailer(&self) -> &dyn OtpMailer {
        self.inner.mailer.as_ref()
    }

    /// Get a reference to the pricing token signer.
    #[must_use]
    pub fn tokens(&self) -> &PricingTokenSigner {
        &self.inner.tokens
    }

    /// Get a reference to the pricing cookie settings.
    #[must_use]
    pub fn pricing_cookie(&self) -> &PricingCookie {
        &self.inner.cookie
    }
}
