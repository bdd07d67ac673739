//! Signed, stateless pricing access tokens.
//!
//! A token is `base64url(json + "." + hex(hmac_sha256(secret, json)))`
//! where `json` is the serialized [`PricingTokenPayload`]. Nothing is stored
//! server-side: a token stays valid until its own `expiresAt`, and the only
//! way to "revoke" one is to overwrite the visitor's cookie.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use chrono::{DateTime, TimeDelta, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use mlm_site_core::Email;

use super::otp::codes_match;

/// URL-safe alphabet, no padding on encode, padding tolerated on decode.
const TOKEN_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const SEPARATOR: char = '.';

/// Claims carried by a pricing access token.
///
/// Field order is part of the signed format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingTokenPayload {
    pub email: Email,
    /// Epoch milliseconds.
    pub issued_at: i64,
    /// Epoch milliseconds.
    pub expires_at: i64,
}

impl PricingTokenPayload {
    /// Expiry as a timestamp, if representable.
    #[must_use]
    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.expires_at)
    }
}

/// A freshly issued token together with its claims.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub value: String,
    pub payload: PricingTokenPayload,
}

/// Reasons a token is not accepted.
///
/// Callers treat every variant as "not verified"; the distinction only
/// reaches debug logs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is not valid base64url")]
    Encoding,

    #[error("token has no signature separator")]
    MissingSeparator,

    #[error("token signature does not match")]
    SignatureMismatch,

    #[error("token payload is not valid: {0}")]
    Malformed(String),

    #[error("token expired")]
    Expired,

    #[error("signing key rejected: {0}")]
    Key(String),
}

/// Issues and verifies pricing access tokens.
#[derive(Clone)]
pub struct PricingTokenSigner {
    secret: SecretString,
    max_age: TimeDelta,
}

impl std::fmt::Debug for PricingTokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PricingTokenSigner")
            .field("secret", &"[REDACTED]")
            .field("max_age", &self.max_age)
            .finish()
    }
}

impl PricingTokenSigner {
    /// Create a signer whose tokens live for `max_age_minutes`.
    #[must_use]
    pub fn new(secret: SecretString, max_age_minutes: u32) -> Self {
        Self {
            secret,
            max_age: TimeDelta::minutes(i64::from(max_age_minutes)),
        }
    }

    /// Token lifetime in whole seconds, used as the cookie `Max-Age`.
    #[must_use]
    pub fn max_age_secs(&self) -> i64 {
        self.max_age.num_seconds()
    }

    /// Issue a token for `email` valid from now.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Key` if the HMAC key is rejected.
    pub fn issue(&self, email: &Email) -> Result<IssuedToken, TokenError> {
        self.issue_at(email, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Key` if the HMAC key is rejected.
    pub fn issue_at(&self, email: &Email, now: DateTime<Utc>) -> Result<IssuedToken, TokenError> {
        let issued_at = now.timestamp_millis();
        let payload = PricingTokenPayload {
            email: email.clone(),
            issued_at,
            expires_at: issued_at + self.max_age.num_milliseconds(),
        };

        let json =
            serde_json::to_string(&payload).map_err(|e| TokenError::Malformed(e.to_string()))?;
        let signature = self.sign(&json)?;
        let value = TOKEN_ENGINE.encode(format!("{json}{SEPARATOR}{signature}"));

        Ok(IssuedToken { value, payload })
    }

    /// Decode a token, returning its claims if it is authentic and unexpired.
    #[must_use]
    pub fn decode(&self, token: &str) -> Option<PricingTokenPayload> {
        self.decode_at(token, Utc::now())
    }

    /// [`decode`](Self::decode) as if the current time were `now`.
    #[must_use]
    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Option<PricingTokenPayload> {
        match self.verify_at(token, now) {
            Ok(payload) => Some(payload),
            Err(e) => {
                tracing::debug!(reason = %e, "Rejected pricing token");
                None
            }
        }
    }

    /// Verify a token, reporting why it was rejected.
    ///
    /// # Errors
    ///
    /// Returns the first check the token fails.
    pub fn verify_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<PricingTokenPayload, TokenError> {
        let decoded = TOKEN_ENGINE
            .decode(token.trim())
            .map_err(|_| TokenError::Encoding)?;
        let decoded = String::from_utf8(decoded).map_err(|_| TokenError::Encoding)?;

        // Signature hex never contains the separator; the payload may.
        let (json, signature) = decoded
            .rsplit_once(SEPARATOR)
            .ok_or(TokenError::MissingSeparator)?;

        let expected = self.sign(json)?;
        if !codes_match(expected.as_bytes(), signature.as_bytes()) {
            return Err(TokenError::SignatureMismatch);
        }

        let payload: PricingTokenPayload =
            serde_json::from_str(json).map_err(|e| TokenError::Malformed(e.to_string()))?;

        if payload.expires_at <= now.timestamp_millis() {
            return Err(TokenError::Expired);
        }

        Ok(payload)
    }

    fn sign(&self, message: &str) -> Result<String, TokenError> {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|e| TokenError::Key(e.to_string()))?;
        mac.update(message.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SECRET: &str = "k3Jx9QpLm2vZt8WnRb5YcHf4GsD7aE1u";

    fn signer(minutes: u32) -> PricingTokenSigner {
        PricingTokenSigner::new(SecretString::from(SECRET.to_string()), minutes)
    }

    fn email(s: &str) -> Email {
        Email::parse(s).unwrap()
    }

    #[test]
    fn test_issue_then_decode() {
        let signer = signer(30);
        let issued = signer.issue(&email("user@example.com")).unwrap();
        let payload = signer.decode(&issued.value).unwrap();

        assert_eq!(payload, issued.payload);
        assert_eq!(payload.email.as_str(), "user@example.com");
        assert_eq!(payload.expires_at - payload.issued_at, 30 * 60 * 1000);
        assert_eq!(signer.max_age_secs(), 1800);
    }

    #[test]
    fn test_expiry_boundary() {
        let signer = signer(30);
        let now = Utc::now();
        let issued = signer.issue_at(&email("user@example.com"), now).unwrap();

        let payload = signer
            .decode_at(&issued.value, now + TimeDelta::seconds(1))
            .unwrap();
        assert_eq!(payload.email.as_str(), "user@example.com");

        assert_eq!(
            signer.verify_at(&issued.value, now + TimeDelta::seconds(1801)),
            Err(TokenError::Expired)
        );
        assert!(
            signer
                .decode_at(&issued.value, now + TimeDelta::seconds(1800))
                .is_none()
        );
    }

    #[test]
    fn test_payload_field_order() {
        let signer = signer(30);
        let issued = signer.issue(&email("a@b.com")).unwrap();
        let decoded = String::from_utf8(TOKEN_ENGINE.decode(&issued.value).unwrap()).unwrap();
        assert!(decoded.starts_with(r#"{"email":"a@b.com","issuedAt":"#));
        assert!(decoded.contains(r#","expiresAt":"#));
    }

    #[test]
    fn test_token_is_url_safe() {
        let issued = signer(30).issue(&email("first.last+tag@example.co.uk")).unwrap();
        assert!(
            issued
                .value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_padded_token_accepted() {
        let signer = signer(30);
        let issued = signer.issue(&email("a@b.com")).unwrap();
        let padding = (4 - issued.value.len() % 4) % 4;
        let padded = format!("{}{}", issued.value, "=".repeat(padding));
        assert!(signer.decode(&padded).is_some());
    }

    #[test]
    fn test_bit_flip_rejected() {
        let signer = signer(30);
        let issued = signer.issue(&email("user@example.com")).unwrap();
        let mut raw = TOKEN_ENGINE.decode(&issued.value).unwrap();
        // Flip a bit inside the email.
        raw[10] ^= 0x01;
        let tampered = TOKEN_ENGINE.encode(&raw);
        assert!(signer.decode(&tampered).is_none());
    }

    #[test]
    fn test_forged_signature_rejected() {
        let signer = signer(30);
        let json = r#"{"email":"attacker@example.com","issuedAt":0,"expiresAt":99999999999999}"#;
        let forged = TOKEN_ENGINE.encode(format!("{json}.{}", "0".repeat(64)));
        assert_eq!(
            signer.verify_at(&forged, Utc::now()),
            Err(TokenError::SignatureMismatch)
        );
    }

    #[test]
    fn test_other_secret_rejected() {
        let issued = signer(30).issue(&email("a@b.com")).unwrap();
        let other = PricingTokenSigner::new(
            SecretString::from("Zq8Lw3Np6Xr1Tv9Bc4Md7Hj2Kf5Gs0Ya".to_string()),
            30,
        );
        assert!(other.decode(&issued.value).is_none());
    }

    #[test]
    fn test_short_signature_rejected() {
        let signer = signer(30);
        let json = r#"{"email":"a@b.com","issuedAt":0,"expiresAt":99999999999999}"#;
        let forged = TOKEN_ENGINE.encode(format!("{json}.abc"));
        assert_eq!(
            signer.verify_at(&forged, Utc::now()),
            Err(TokenError::SignatureMismatch)
        );
    }

    #[test]
    fn test_garbage_never_panics() {
        let signer = signer(30);
        for token in ["", "!!!", "bm8tc2VwYXJhdG9y", "e30", ".", "YS5i"] {
            assert!(signer.decode(token).is_none(), "accepted {token:?}");
        }
        assert_eq!(
            signer.verify_at("bm8tc2VwYXJhdG9y", Utc::now()),
            Err(TokenError::MissingSeparator)
        );
    }

    #[test]
    fn test_signed_but_malformed_payload() {
        let signer = signer(30);
        let json = r#"{"email":"not-an-email","issuedAt":0,"expiresAt":1}"#;
        let sig = signer.sign(json).unwrap();
        let token = TOKEN_ENGINE.encode(format!("{json}.{sig}"));
        assert!(matches!(
            signer.verify_at(&token, Utc::now()),
            Err(TokenError::Malformed(_))
        ));
    }
}
