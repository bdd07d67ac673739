//! One-time passcode store.
//!
//! A visitor requests a code for an email address, receives it by mail and
//! types it back in. At most one live code exists per email: storing a new
//! one replaces the old. A code verifies at most once.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;

use mlm_site_core::{Email, OtpCode};

use crate::db::RepositoryError;

/// Wrong guesses allowed before a code is discarded.
pub const MAX_VERIFY_ATTEMPTS: i32 = 5;

/// A live OTP as seen by callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredOtp {
    pub otp: OtpCode,
    pub expires_at: DateTime<Utc>,
}

/// Persistence for pricing-gate OTPs.
#[async_trait]
pub trait OtpStore: Send + Sync {
    /// Store `otp` for `email`, replacing any previous code.
    async fn store_otp(
        &self,
        email: &Email,
        otp: &OtpCode,
        ttl_minutes: u32,
    ) -> Result<(), RepositoryError>;

    /// Check `otp` for `email`, consuming the code on success.
    ///
    /// Returns `false` when there is no code, it has expired, or it does not
    /// match. Callers cannot tell these apart.
    async fn verify_otp(&self, email: &Email, otp: &OtpCode) -> Result<bool, RepositoryError>;

    /// The live code for `email`, if any (expired codes included until swept).
    async fn get_stored_otp(&self, email: &Email) -> Result<Option<StoredOtp>, RepositoryError>;

    /// Delete expired codes, returning how many were removed.
    async fn delete_expired(&self) -> Result<u64, RepositoryError>;

    /// Check the backing store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Generate a new six-digit code.
#[must_use]
pub fn generate_otp() -> OtpCode {
    OtpCode::generate()
}

/// Constant-time comparison of two codes.
///
/// Lengths are not secret, so a length mismatch returns early.
#[must_use]
pub fn codes_match(stored: &[u8], provided: &[u8]) -> bool {
    if stored.len() != provided.len() {
        return false;
    }
    stored.ct_eq(provided).into()
}

#[derive(Debug, Clone)]
struct MemoryEntry {
    otp: OtpCode,
    expires_at: DateTime<Utc>,
    attempts: i32,
}

/// In-process OTP store for tests and local development without `PostgreSQL`.
#[derive(Debug, Default)]
pub struct MemoryOtpStore {
    entries: Mutex<HashMap<Email, MemoryEntry>>,
}

impl MemoryOtpStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of codes currently held, expired or not.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Whether the store holds no codes.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl OtpStore for MemoryOtpStore {
    async fn store_otp(
        &self,
        email: &Email,
        otp: &OtpCode,
        ttl_minutes: u32,
    ) -> Result<(), RepositoryError> {
        let entry = MemoryEntry {
            otp: otp.clone(),
            expires_at: Utc::now() + TimeDelta::minutes(i64::from(ttl_minutes)),
            attempts: 0,
        };
        self.entries.lock().await.insert(email.clone(), entry);
        Ok(())
    }

    async fn verify_otp(&self, email: &Email, otp: &OtpCode) -> Result<bool, RepositoryError> {
        let mut entries = self.entries.lock().await;

        let Some(entry) = entries.get_mut(email) else {
            tracing::debug!(email = %email.redacted(), "No OTP on record");
            return Ok(false);
        };

        if entry.expires_at <= Utc::now() {
            tracing::debug!(email = %email.redacted(), "OTP expired");
            entries.remove(email);
            return Ok(false);
        }

        if codes_match(entry.otp.as_bytes(), otp.as_bytes()) {
            entries.remove(email);
            return Ok(true);
        }

        entry.attempts = entry.attempts.saturating_add(1);
        if entry.attempts >= MAX_VERIFY_ATTEMPTS {
            tracing::info!(email = %email.redacted(), "OTP attempts exhausted, discarding code");
            entries.remove(email);
        } else {
            tracing::debug!(email = %email.redacted(), attempts = entry.attempts, "OTP mismatch");
        }

        Ok(false)
    }

    async fn get_stored_otp(&self, email: &Email) -> Result<Option<StoredOtp>, RepositoryError> {
        Ok(self.entries.lock().await.get(email).map(|entry| StoredOtp {
            otp: entry.otp.clone(),
            expires_at: entry.expires_at,
        }))
    }

    async fn delete_expired(&self) -> Result<u64, RepositoryError> {
        let now = Utc::now();
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        Ok((before - entries.len()) as u64)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
