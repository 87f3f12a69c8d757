//! # Session Metrics
//!
//! OpenTelemetry instruments for storage session lifecycle events. They record
//! through the global meter provider, so they are no-ops until the hosting
//! process installs one.
//!
//! ```rust
//! use opentelemetry::KeyValue;
//! use tasker_persistence::metrics;
//!
//! metrics::session_refreshes_total().add(1, &[KeyValue::new("outcome", "refreshed")]);
//! ```

use opentelemetry::metrics::{Counter, Histogram, Meter};
use std::sync::OnceLock;

static SESSION_METER: OnceLock<Meter> = OnceLock::new();

fn meter() -> &'static Meter {
    SESSION_METER.get_or_init(|| opentelemetry::global::meter("tasker-persistence"))
}

/// Session (re)initialization attempts
pub fn session_init_requests_total() -> Counter<u64> {
    meter()
        .u64_counter("tasker.storage.session.init.requests.total")
        .with_description("Total number of storage session initialization attempts")
        .build()
}

/// Failed session (re)initialization attempts
///
/// Labels:
/// - error_type: initialization, timeout, configuration
pub fn session_init_failures_total() -> Counter<u64> {
    meter()
        .u64_counter("tasker.storage.session.init.failures.total")
        .with_description("Total number of failed storage session initializations")
        .build()
}

/// Session initialization duration in milliseconds
pub fn session_init_duration() -> Histogram<f64> {
    meter()
        .f64_histogram("tasker.storage.session.init.duration")
        .with_description("Storage session initialization duration in milliseconds")
        .with_unit("ms")
        .build()
}

/// Refresh protocol runs
///
/// Labels:
/// - outcome: refreshed, throttled, not_started, failed
pub fn session_refreshes_total() -> Counter<u64> {
    meter()
        .u64_counter("tasker.storage.session.refreshes.total")
        .with_description("Total number of storage session refresh attempts by outcome")
        .build()
}
