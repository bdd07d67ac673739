//! Pricing access token tools.
//!
//! # Environment Variables
//!
//! - `PRICING_TOKEN_SECRET` - HMAC secret shared with the web server
//! - `PRICING_TOKEN_MAX_AGE_MINUTES` - Token lifetime (default 30)

use chrono::Utc;
use mlm_site_core::Email;
use mlm_site_web::config::PricingConfig;
use mlm_site_web::services::PricingTokenSigner;

use super::CommandError;

fn signer() -> Result<PricingTokenSigner, CommandError> {
    dotenvy::dotenv().ok();
    let config = PricingConfig::from_env()?;
    Ok(PricingTokenSigner::new(
        config.token_secret,
        config.token_max_age_minutes,
    ))
}

/// Issue a token for `email` and print it.
///
/// # Errors
///
/// Returns error if the email is invalid or the secret is not configured.
pub fn issue(email: &str) -> Result<(), CommandError> {
    let email = Email::parse(email).map_err(|_| CommandError::InvalidEmail(email.to_owned()))?;
    let issued = signer()?.issue(&email)?;

    tracing::info!(email = %email.redacted(), expires_at = issued.payload.expires_at, "Token issued");

    #[allow(clippy::print_stdout)]
    {
        println!("{}", issued.value);
    }
    Ok(())
}

/// Verify `token` and print its claims as JSON.
///
/// # Errors
///
/// Returns the reason the token is rejected.
pub fn inspect(token: &str) -> Result<(), CommandError> {
    let payload = signer()?.verify_at(token, Utc::now())?;

    #[allow(clippy::print_stdout)]
    {
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).unwrap_or_default()
        );
        if let Some(expires) = payload.expires_at_utc() {
            println!("expires: {expires}");
        }
    }
    Ok(())
}
