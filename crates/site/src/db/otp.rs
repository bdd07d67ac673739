//! OTP repository for the pricing gate.
//!
//! Queries use the runtime-checked `sqlx::query*` functions so the crate
//! builds without a live database.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use sqlx::PgPool;

use mlm_site_core::{Email, OtpCode};

use super::RepositoryError;
use crate::services::otp::{MAX_VERIFY_ATTEMPTS, OtpStore, StoredOtp, codes_match};

/// `PostgreSQL`-backed OTP store.
#[derive(Clone)]
pub struct OtpRepository {
    pool: PgPool,
}

impl OtpRepository {
    /// Create a new OTP repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OtpStore for OtpRepository {
    async fn store_otp(
        &self,
        email: &Email,
        otp: &OtpCode,
        ttl_minutes: u32,
    ) -> Result<(), RepositoryError> {
        let expires_at = Utc::now() + TimeDelta::minutes(i64::from(ttl_minutes));
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM pricing_otp WHERE email = $1")
            .bind(email)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r"
            INSERT INTO pricing_otp (email, otp, attempts, expires_at)
            VALUES ($1, $2, 0, $3)
            ",
        )
        .bind(email)
        .bind(otp.as_str())
        .bind(expires_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn verify_otp(&self, email: &Email, otp: &OtpCode) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes concurrent verifications of the same code.
        let row: Option<(String, DateTime<Utc>, i32)> = sqlx::query_as(
            r"
            SELECT otp, expires_at, attempts
            FROM pricing_otp
            WHERE email = $1
            FOR UPDATE
            ",
        )
        .bind(email)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((stored, expires_at, attempts)) = row else {
            tracing::debug!(email = %email.redacted(), "No OTP on record");
            return Ok(false);
        };

        if expires_at <= Utc::now() {
            tracing::debug!(email = %email.redacted(), "OTP expired");
            sqlx::query("DELETE FROM pricing_otp WHERE email = $1")
                .bind(email)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            return Ok(false);
        }

        if codes_match(stored.as_bytes(), otp.as_bytes()) {
            sqlx::query("DELETE FROM pricing_otp WHERE email = $1")
                .bind(email)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            return Ok(true);
        }

        let attempts = attempts.saturating_add(1);
        if attempts >= MAX_VERIFY_ATTEMPTS {
            tracing::info!(email = %email.redacted(), "OTP attempts exhausted, discarding code");
            sqlx::query("DELETE FROM pricing_otp WHERE email = $1")
                .bind(email)
                .execute(&mut *tx)
                .await?;
        } else {
            tracing::debug!(email = %email.redacted(), attempts, "OTP mismatch");
            sqlx::query("UPDATE pricing_otp SET attempts = $2 WHERE email = $1")
                .bind(email)
                .bind(attempts)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        Ok(false)
    }

    async fn get_stored_otp(&self, email: &Email) -> Result<Option<StoredOtp>, RepositoryError> {
        let row: Option<(String, DateTime<Utc>)> =
            sqlx::query_as("SELECT otp, expires_at FROM pricing_otp WHERE email = $1")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|(otp, expires_at)| {
            let otp = OtpCode::parse(&otp).map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid otp in database: {e}"))
            })?;
            Ok(StoredOtp { otp, expires_at })
        })
        .transpose()
    }

    async fn delete_expired(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM pricing_otp WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}
