//! Sliding-window login lockout.
//!
//! Tracks failed password checks per username and blocks further
//! attempts once the window fills. History lives in the database
//! (`login_failures`), so a lockout survives a process restart.

use std::time::Duration;

use chrono::Utc;
use tracing::debug;

use crate::db::{Database, LoginFailureRepository};
use crate::Result;

/// Maximum failures before lockout.
pub const MAX_LOGIN_FAILURES: u32 = 5;

/// Sliding window length (5 minutes).
pub const LOCKOUT_WINDOW_SECS: u64 = 5 * 60;

/// Result of a lockout check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockoutStatus {
    /// Attempt may proceed.
    Allowed,
    /// Too many recent failures.
    Locked {
        /// Time until the oldest counted failure leaves the window.
        retry_after: Duration,
    },
}

/// Sliding-window failure tracker, backed by the login failure history.
#[derive(Debug, Clone)]
pub struct LockoutTracker {
    max_failures: u32,
    window: Duration,
}

impl Default for LockoutTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl LockoutTracker {
    /// Create a tracker with the default policy (5 failures / 5 minutes).
    pub fn new() -> Self {
        Self {
            max_failures: MAX_LOGIN_FAILURES,
            window: Duration::from_secs(LOCKOUT_WINDOW_SECS),
        }
    }

    /// Create a tracker with custom limits.
    pub fn with_limits(max_failures: u32, window: Duration) -> Self {
        Self {
            max_failures,
            window,
        }
    }

    /// Check whether an attempt for the username may proceed.
    ///
    /// A full window whose oldest failure has aged out is cleared here,
    /// so stale history never blocks a later attempt.
    pub async fn check(&self, db: &Database, username: &str) -> Result<LockoutStatus> {
        let repo = LoginFailureRepository::new(db.pool());
        let recent = repo.recent(username, self.max_failures).await?;

        if recent.len() < self.max_failures as usize {
            return Ok(LockoutStatus::Allowed);
        }

        // `recent` is newest-first, so the last entry is the oldest
        // counted failure.
        let oldest = recent[recent.len() - 1].failed_at;
        let now = Utc::now().timestamp_millis();
        let age_ms = (now - oldest).max(0) as u64;
        let window_ms = self.window.as_millis() as u64;

        if age_ms < window_ms {
            return Ok(LockoutStatus::Locked {
                retry_after: Duration::from_millis(window_ms - age_ms),
            });
        }

        debug!(username = %username, "Lockout window elapsed, clearing failure history");
        repo.clear(username).await?;
        Ok(LockoutStatus::Allowed)
    }

    /// Record a failed password check and prune old history.
    pub async fn record_failure(&self, db: &Database, username: &str) -> Result<()> {
        let repo = LoginFailureRepository::new(db.pool());
        repo.append(username, Utc::now().timestamp_millis()).await?;
        repo.prune(username, self.max_failures).await?;
        Ok(())
    }

    /// Forget all failures for the username (on successful login).
    pub async fn clear(&self, db: &Database, username: &str) -> Result<()> {
        LoginFailureRepository::new(db.pool())
            .clear(username)
            .await
    }
}
