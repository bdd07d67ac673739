//! Background task that deletes expired OTP rows.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

use super::otp::OtpStore;

/// Spawn the sweep loop, running every `interval`.
///
/// The first sweep runs one interval after start-up. A failed sweep is
/// logged and retried on the next tick.
pub fn spawn_otp_sweeper(store: Arc<dyn OtpStore>, interval: Duration) -> JoinHandle<()> {
    info!(interval_secs = interval.as_secs(), "Spawning OTP sweep task");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            sweep_once(store.as_ref()).await;
        }
    })
}

/// Run one sweep, returning how many codes were removed.
#[instrument(skip_all)]
pub async fn sweep_once(store: &dyn OtpStore) -> u64 {
    match store.delete_expired().await {
        Ok(0) => {
            debug!("No expired OTPs");
            0
        }
        Ok(deleted) => {
            info!(deleted, "Swept expired OTPs");
            deleted
        }
        Err(e) => {
            warn!(error = %e, "OTP sweep failed");
            0
        }
    }
}
