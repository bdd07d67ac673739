//! One-time passcode maintenance.
//!
//! The web server sweeps expired codes on an interval; this runs the same
//! cleanup once, e.g. from cron while the server is down.

use mlm_site_web::db::OtpRepository;
use mlm_site_web::services::OtpStore;

use super::{CommandError, connect};

/// Delete expired passcodes and return how many were removed.
///
/// # Errors
///
/// Returns error if the database is unreachable.
pub async fn sweep() -> Result<u64, CommandError> {
    let repo = OtpRepository::new(connect().await?);

    let deleted = repo.delete_expired().await?;
    tracing::info!(deleted, "Expired OTPs removed");

    Ok(deleted)
}
