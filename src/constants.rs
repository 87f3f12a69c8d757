//! # Storage Session Constants
//!
//! Defaults and operational bounds for the storage session layer.

use std::time::Duration;

/// Minimum time between two successful session (re)initializations.
pub const SESSION_REFRESH_MIN_INTERVAL: Duration = Duration::from_secs(5);

pub const DEFAULT_PORT: u16 = 9042;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 2_000;
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_CONNECTIONS_PER_HOST: u32 = 2;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "TASKER_STORAGE";

/// Lifecycle status of a long-lived component
pub mod status {
    pub const STARTED: u8 = 1;
    pub const STOPPED: u8 = 2;
}

/// Values for the `outcome` label on refresh metrics
pub mod refresh_outcome {
    pub const REFRESHED: &str = "refreshed";
    pub const THROTTLED: &str = "throttled";
    pub const NOT_STARTED: &str = "not_started";
    pub const FAILED: &str = "failed";
}
