#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Tasker Persistence
//!
//! Durable-storage access layer for the Tasker workflow orchestration platform.
//!
//! ## Overview
//!
//! Workflow execution state, task queues and cluster metadata live in a
//! clustered, partition-tolerant storage backend. This crate keeps exactly one
//! live connection pool to that cluster per service role and replaces it
//! transparently when the driver reports that no usable connections remain.
//!
//! ## Module Organization
//!
//! - [`session`] - Session manager and the per-call query/batch/iterator wrappers
//! - [`cluster`] - Connection builder (configuration + endpoints → live session)
//! - [`driver`] - Traits a storage driver implements
//! - [`resolver`] - Endpoint resolution
//! - [`config`] - Storage configuration loading and validation
//! - [`error`] - Error taxonomy and failure classification
//! - [`metrics`] - OpenTelemetry instruments
//! - [`logging`] - Structured logging setup
//!
//! ## Refresh Semantics
//!
//! - Reads of the current session never take a lock
//! - At most one rebuild runs at a time
//! - Rebuilds are throttled to one per `refresh_min_interval` (default 5s)
//! - Superseded sessions are closed in the background
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # All tests
//! ```

pub mod cluster;
pub mod config;
pub mod constants;
pub mod driver;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod resolver;
pub mod session;

pub use cluster::{build_cluster_spec, ClusterSpec, Credentials};
pub use config::StorageConfig;
pub use driver::{BatchKind, ClusterConnector, Consistency, Row, SerialConsistency, Value};
pub use error::{FailureClass, StoreError, StoreResult};
pub use resolver::{EndpointResolver, NoopResolver, StaticResolver};
pub use session::{
    Batch, CasResult, Iter, Query, RefreshOutcome, SessionManager, SessionStatsSnapshot,
};
