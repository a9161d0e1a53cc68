//! Background housekeeping
//!
//! Handles:
//! - Expired admin session removal
//! - Idle rate-limit window removal

use std::time::Duration;
use tokio::time::interval;
use tracing::{debug, info};

use crate::auth::SessionStore;
use crate::ratelimit::RateLimiter;

/// Start the periodic cleanup task
pub fn start_cleanup_tasks(sessions: SessionStore, limiter: RateLimiter, every_secs: u64) {
    let cleanup_interval = Duration::from_secs(every_secs.max(1));

    tokio::spawn(async move {
        let mut ticker = interval(cleanup_interval);

        loop {
            ticker.tick().await;
            let report = run_cleanup(&sessions, &limiter).await;
            debug!(?report, "Cleanup pass finished");
        }
    });
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub expired_sessions: usize,
    pub idle_rate_windows: usize,
}

pub async fn run_cleanup(sessions: &SessionStore, limiter: &RateLimiter) -> CleanupReport {
    let (expired_sessions, idle_rate_windows) =
        tokio::join!(sessions.purge_expired(), limiter.cleanup());

    if expired_sessions > 0 {
        info!("Removed {} expired admin sessions", expired_sessions);
    }
    if idle_rate_windows > 0 {
        debug!("Dropped {} idle rate-limit windows", idle_rate_windows);
    }

    CleanupReport {
        expired_sessions,
        idle_rate_windows,
    }
}
