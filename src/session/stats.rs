//! # Session Statistics
//!
//! Atomic counters describing how often the refresh protocol ran and how each
//! run ended. Writers use `Relaxed` ordering; readers take a [`SessionStatsSnapshot`].

use super::manager::RefreshOutcome;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct SessionStats {
    /// Connection-exhaustion errors observed by operation wrappers
    refresh_triggers: AtomicU64,

    refreshed: AtomicU64,

    /// Refreshes skipped because the last (re)initialization was too recent
    throttled: AtomicU64,

    /// Refreshes skipped because the manager was not started
    not_started: AtomicU64,

    failed: AtomicU64,

    /// Superseded sessions whose background close has finished
    retired_sessions: AtomicU64,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_trigger(&self) {
        self.refresh_triggers.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_outcome(&self, outcome: RefreshOutcome) {
        let counter = match outcome {
            RefreshOutcome::Refreshed { .. } => &self.refreshed,
            RefreshOutcome::SkippedThrottled => &self.throttled,
            RefreshOutcome::SkippedNotStarted => &self.not_started,
            RefreshOutcome::Failed => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_retired(&self) {
        self.retired_sessions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SessionStatsSnapshot {
        SessionStatsSnapshot {
            refresh_triggers: self.refresh_triggers.load(Ordering::Relaxed),
            refreshed: self.refreshed.load(Ordering::Relaxed),
            throttled: self.throttled.load(Ordering::Relaxed),
            not_started: self.not_started.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            retired_sessions: self.retired_sessions.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`SessionStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStatsSnapshot {
    pub refresh_triggers: u64,
    pub refreshed: u64,
    pub throttled: u64,
    pub not_started: u64,
    pub failed: u64,
    pub retired_sessions: u64,
}

impl SessionStatsSnapshot {
    /// Refresh runs that have finished, whatever their outcome.
    pub fn completed_refreshes(&self) -> u64 {
        self.refreshed + self.throttled + self.not_started + self.failed
    }
}
