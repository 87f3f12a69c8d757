//! # Session Manager
//!
//! Owns the single live storage session and replaces it when the driver reports
//! that its pool has run out of usable connections.
//!
//! ## Concurrency
//!
//! - The current [`SessionHandle`] sits in an [`ArcSwap`]. Every operation loads
//!   it without locking, so readers never wait on each other or on a refresh.
//! - Refreshes serialize on an async mutex that also guards the last-init
//!   timestamp. The lock covers the throttle decision and one bounded rebuild,
//!   never query execution.
//! - A superseded session is closed on a spawned task; operations still running
//!   against it finish or fail on their own.

use super::batch::Batch;
use super::handle::SessionHandle;
use super::iter::Iter;
use super::query::Query;
use super::stats::{SessionStats, SessionStatsSnapshot};
use crate::cluster;
use crate::config::StorageConfig;
use crate::constants::{refresh_outcome, status};
use crate::driver::{BatchKind, ClusterConnector, Row, Value};
use crate::error::{FailureClass, StoreError, StoreResult};
use crate::logging::log_session_operation;
use crate::metrics;
use crate::resolver::EndpointResolver;
use arc_swap::ArcSwap;
use opentelemetry::KeyValue;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// How a single run of the refresh protocol ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new session was published
    Refreshed { generation: u64 },
    /// The manager is not (or no longer) started
    SkippedNotStarted,
    /// The last (re)initialization happened less than the minimum interval ago
    SkippedThrottled,
    /// Building the replacement failed; the previous session stays current
    Failed,
}

impl RefreshOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            RefreshOutcome::Refreshed { .. } => refresh_outcome::REFRESHED,
            RefreshOutcome::SkippedThrottled => refresh_outcome::THROTTLED,
            RefreshOutcome::SkippedNotStarted => refresh_outcome::NOT_STARTED,
            RefreshOutcome::Failed => refresh_outcome::FAILED,
        }
    }
}

/// Outcome of a conditional batch
pub struct CasResult {
    pub applied: bool,
    /// Existing row that prevented the batch from applying (empty when applied)
    pub previous: Row,
    pub iter: Iter,
}

struct RefreshState {
    last_init: Instant,
}

struct ManagerInner {
    status: AtomicU8,
    current: ArcSwap<SessionHandle>,
    refresh_lock: Mutex<RefreshState>,
    next_generation: AtomicU64,
    config: StorageConfig,
    resolver: Arc<dyn EndpointResolver>,
    connector: Arc<dyn ClusterConnector>,
    stats: SessionStats,
}

/// Shared, cheaply cloneable access to the storage cluster.
///
/// One manager is created per service role at startup and closed once on
/// shutdown. Operations must not be issued after [`close`](Self::close).
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<ManagerInner>,
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("started", &self.is_started())
            .field("current", &*self.inner.current.load())
            .field("keyspace", &self.inner.config.keyspace)
            .field("stats", &self.inner.stats.snapshot())
            .finish()
    }
}

impl SessionManager {
    /// Connect to the cluster and start the manager.
    ///
    /// Fails with [`StoreError::Initialization`] (or `Configuration`) when no
    /// session can be established. There is no internal retry.
    pub async fn new(
        config: StorageConfig,
        resolver: Arc<dyn EndpointResolver>,
        connector: Arc<dyn ClusterConnector>,
    ) -> StoreResult<Self> {
        config.validate()?;

        let session = cluster::connect(&config, resolver.as_ref(), connector.as_ref()).await?;
        let handle = SessionHandle::new(1, session);

        info!(
            generation = handle.generation(),
            session_id = %handle.session_id(),
            keyspace = %config.keyspace,
            "✅ Storage session manager started"
        );
        log_session_operation("start", handle.generation(), "started", None);

        Ok(Self {
            inner: Arc::new(ManagerInner {
                status: AtomicU8::new(status::STARTED),
                current: ArcSwap::from_pointee(handle),
                refresh_lock: Mutex::new(RefreshState {
                    last_init: Instant::now(),
                }),
                next_generation: AtomicU64::new(2),
                config,
                resolver,
                connector,
                stats: SessionStats::new(),
            }),
        })
    }

    pub fn query(&self, statement: &str, values: Vec<Value>) -> Query {
        let driver_query = self.inner.current.load().session().query(statement, values);
        Query::new(self.clone(), driver_query)
    }

    pub fn new_batch(&self, kind: BatchKind) -> Batch {
        let driver_batch = self.inner.current.load().session().new_batch(kind);
        Batch::new(self.clone(), driver_batch)
    }

    pub async fn execute_batch(&self, batch: &Batch) -> StoreResult<()> {
        let handle = self.inner.current.load_full();
        let result = handle.session().execute_batch(batch.driver_batch()).await;
        self.observe(result)
    }

    /// Execute a batch containing conditional statements.
    pub async fn execute_batch_cas(&self, batch: &Batch) -> StoreResult<CasResult> {
        let handle = self.inner.current.load_full();
        let result = handle.session().execute_batch_cas(batch.driver_batch()).await;
        let outcome = self.observe(result)?;
        Ok(CasResult {
            applied: outcome.applied,
            previous: outcome.previous,
            iter: Iter::new(self.clone(), outcome.iter),
        })
    }

    /// Wait until all reachable nodes report the same schema version, giving up
    /// with [`StoreError::Timeout`] after `deadline`.
    pub async fn await_schema_agreement(&self, deadline: Duration) -> StoreResult<()> {
        let handle = self.inner.current.load_full();
        let result =
            match tokio::time::timeout(deadline, handle.session().await_schema_agreement()).await {
                Ok(result) => result,
                Err(_) => Err(StoreError::Timeout(format!(
                    "schema agreement not reached within {}ms",
                    deadline.as_millis()
                ))),
            };
        self.observe(result)
    }

    /// Stop the manager and close the current session.
    ///
    /// Only the first call has any effect. A refresh that is already rebuilding
    /// finishes first, so the session closed here is the last one published.
    pub async fn close(&self) {
        if self
            .inner
            .status
            .compare_exchange(
                status::STARTED,
                status::STOPPED,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return;
        }

        let _refresh_guard = self.inner.refresh_lock.lock().await;
        let handle = self.inner.current.load_full();
        handle.session().close().await;

        info!(
            generation = handle.generation(),
            session_id = %handle.session_id(),
            "🛑 Storage session manager closed"
        );
        log_session_operation("close", handle.generation(), "stopped", None);
    }

    pub fn is_started(&self) -> bool {
        self.inner.status.load(Ordering::Acquire) == status::STARTED
    }

    /// Generation of the session operations are currently issued against.
    pub fn current_generation(&self) -> u64 {
        self.inner.current.load().generation()
    }

    pub fn stats(&self) -> SessionStatsSnapshot {
        self.inner.stats.snapshot()
    }

    pub fn config(&self) -> &StorageConfig {
        &self.inner.config
    }

    /// Time of the last successful (re)initialization.
    ///
    /// Waits for an in-progress refresh to finish.
    pub async fn last_initialized_at(&self) -> Instant {
        self.inner.refresh_lock.lock().await.last_init
    }

    /// Route an operation error through the failure classifier.
    ///
    /// Connection exhaustion schedules a refresh on the runtime and returns
    /// immediately; every other error is ignored.
    pub fn handle_error(&self, err: &StoreError) {
        if err.classify() != FailureClass::ConnectionExhausted {
            return;
        }

        self.inner.stats.record_trigger();
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let manager = self.clone();
                runtime.spawn(async move {
                    manager.refresh().await;
                });
            }
            Err(_) => {
                warn!(error = %err, "No async runtime available, storage session refresh skipped");
            }
        }
    }

    pub(crate) fn observe<T>(&self, result: StoreResult<T>) -> StoreResult<T> {
        if let Err(err) = &result {
            self.handle_error(err);
        }
        result
    }

    /// Run the refresh protocol once.
    ///
    /// At most one caller rebuilds at a time; others wait for the lock and then
    /// almost always find the throttle window still open.
    pub async fn refresh(&self) -> RefreshOutcome {
        let outcome = self.try_refresh().await;
        self.inner.stats.record_outcome(outcome);
        metrics::session_refreshes_total().add(1, &[KeyValue::new("outcome", outcome.label())]);
        outcome
    }

    async fn try_refresh(&self) -> RefreshOutcome {
        if !self.is_started() {
            return RefreshOutcome::SkippedNotStarted;
        }

        let mut state = self.inner.refresh_lock.lock().await;

        // close() may have won the lock first
        if !self.is_started() {
            return RefreshOutcome::SkippedNotStarted;
        }

        let min_interval = self.inner.config.refresh_min_interval();
        let elapsed = state.last_init.elapsed();
        if elapsed < min_interval {
            warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                min_interval_ms = min_interval.as_millis() as u64,
                "Too soon to refresh storage session"
            );
            return RefreshOutcome::SkippedThrottled;
        }

        let previous_generation = self.current_generation();
        warn!(generation = previous_generation, "🔄 Refreshing storage session");

        let session = match cluster::connect(
            &self.inner.config,
            self.inner.resolver.as_ref(),
            self.inner.connector.as_ref(),
        )
        .await
        {
            Ok(session) => session,
            Err(err) => {
                error!(
                    generation = previous_generation,
                    error = %err,
                    "❌ Unable to refresh storage session"
                );
                log_session_operation(
                    "refresh",
                    previous_generation,
                    "failed",
                    Some(&err.to_string()),
                );
                return RefreshOutcome::Failed;
            }
        };

        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let handle = SessionHandle::new(generation, session);
        let session_id = handle.session_id();

        state.last_init = Instant::now();
        let previous = self.inner.current.swap(Arc::new(handle));
        drop(state);

        self.retire(previous);

        warn!(
            generation,
            previous_generation,
            session_id = %session_id,
            "✅ Successfully refreshed storage session"
        );
        log_session_operation("refresh", generation, "refreshed", None);
        RefreshOutcome::Refreshed { generation }
    }

    // Close a superseded session in the background; the result is only logged.
    fn retire(&self, handle: Arc<SessionHandle>) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            handle.session().close().await;
            inner.stats.record_retired();
            debug!(
                generation = handle.generation(),
                session_id = %handle.session_id(),
                "Superseded storage session closed"
            );
        });
    }
}
