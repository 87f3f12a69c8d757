//! Mock Storage Driver for Testing
//!
//! Scriptable in-memory implementation of the driver traits. It counts connect
//! attempts and session closes, and fails operations according to simple rules:
//!
//! - an exhausted session fails everything with `ConnectionExhausted`
//! - a closed session fails everything with a generic driver error
//! - statements containing `BAD`, `SLOW`, `QUORUM_FAIL` or `UNAVAILABLE` fail
//!   with the matching statement-level error
//! - conditional statements containing `CONFLICT` are not applied
//! - iterators over statements containing `PAGE_EXHAUST` fail on close

use async_trait::async_trait;
use serde_json::json;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tasker_persistence::driver::{
    BatchCasOutcome, BatchKind, BatchStatements, ClusterConnector, Consistency, Row, RowIter,
    SerialConsistency, StoreBatch, StoreQuery, StoreSession, Value,
};
use tasker_persistence::{ClusterSpec, StoreError, StoreResult};
use tokio::sync::Semaphore;

/// Settings applied to the most recent query through the builder surface
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySettings {
    pub consistency: Option<Consistency>,
    pub serial_consistency: Option<SerialConsistency>,
    pub page_size: Option<usize>,
    pub page_state: Option<Vec<u8>>,
    pub timestamp: Option<i64>,
    pub idempotent: bool,
}

/// Observable state of one mock session
#[derive(Debug)]
pub struct SessionState {
    pub number: usize,
    exhausted: AtomicBool,
    closed: AtomicBool,
    close_calls: AtomicUsize,
    executed: Mutex<Vec<String>>,
    last_settings: Mutex<Option<QuerySettings>>,
}

impl SessionState {
    fn new(number: usize) -> Self {
        Self {
            number,
            exhausted: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            close_calls: AtomicUsize::new(0),
            executed: Mutex::new(Vec::new()),
            last_settings: Mutex::new(None),
        }
    }

    /// Make every further operation on this session report connection exhaustion
    pub fn exhaust(&self) {
        self.exhausted.store(true, Ordering::SeqCst);
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    pub fn last_settings(&self) -> Option<QuerySettings> {
        self.last_settings.lock().unwrap().clone()
    }

    fn check(&self, statement: &str) -> StoreResult<()> {
        if self.exhausted.load(Ordering::SeqCst) {
            return Err(StoreError::ConnectionExhausted(format!(
                "session {} has no usable connections",
                self.number
            )));
        }
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Driver(format!("session {} is closed", self.number)));
        }
        if statement.contains("BAD") {
            return Err(StoreError::InvalidStatement(statement.to_string()));
        }
        if statement.contains("SLOW") {
            return Err(StoreError::Timeout(statement.to_string()));
        }
        if statement.contains("QUORUM_FAIL") {
            return Err(StoreError::Consistency("2 of 3 replicas required".to_string()));
        }
        if statement.contains("UNAVAILABLE") {
            return Err(StoreError::Unavailable("no replica for token".to_string()));
        }
        self.executed.lock().unwrap().push(statement.to_string());
        Ok(())
    }
}

#[derive(Default)]
struct ClusterShared {
    connect_attempts: AtomicUsize,
    failing_connects: AtomicBool,
    schema_disagreement: AtomicBool,
    gate: Mutex<Option<Arc<Semaphore>>>,
    sessions: Mutex<Vec<Arc<SessionState>>>,
    last_spec: Mutex<Option<ClusterSpec>>,
}

/// In-memory cluster acting as the `ClusterConnector`
#[derive(Clone, Default)]
pub struct MockCluster {
    shared: Arc<ClusterShared>,
}

impl fmt::Debug for MockCluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockCluster")
            .field("connect_attempts", &self.connect_attempts())
            .field("sessions_built", &self.sessions_built())
            .finish()
    }
}

impl MockCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect_attempts(&self) -> usize {
        self.shared.connect_attempts.load(Ordering::SeqCst)
    }

    pub fn sessions_built(&self) -> usize {
        self.shared.sessions.lock().unwrap().len()
    }

    /// The n-th successfully built session, starting at 1
    pub fn session(&self, n: usize) -> Arc<SessionState> {
        self.shared.sessions.lock().unwrap()[n - 1].clone()
    }

    pub fn last_spec(&self) -> Option<ClusterSpec> {
        self.shared.last_spec.lock().unwrap().clone()
    }

    pub fn fail_connects(&self, failing: bool) {
        self.shared.failing_connects.store(failing, Ordering::SeqCst);
    }

    pub fn disagree_on_schema(&self, disagree: bool) {
        self.shared.schema_disagreement.store(disagree, Ordering::SeqCst);
    }

    /// Block connect attempts until [`release_connects`](Self::release_connects)
    pub fn hold_connects(&self) {
        *self.shared.gate.lock().unwrap() = Some(Arc::new(Semaphore::new(0)));
    }

    pub fn release_connects(&self) {
        if let Some(gate) = self.shared.gate.lock().unwrap().take() {
            gate.add_permits(Semaphore::MAX_PERMITS / 2);
        }
    }
}

#[async_trait]
impl ClusterConnector for MockCluster {
    async fn connect(&self, spec: &ClusterSpec) -> StoreResult<Arc<dyn StoreSession>> {
        self.shared.connect_attempts.fetch_add(1, Ordering::SeqCst);
        *self.shared.last_spec.lock().unwrap() = Some(spec.clone());

        let gate = self.shared.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            let _permit = gate
                .acquire()
                .await
                .map_err(|e| StoreError::Driver(e.to_string()))?;
        }

        if self.shared.failing_connects.load(Ordering::SeqCst) {
            return Err(StoreError::Driver(format!(
                "connection refused by {}",
                spec.hosts.join(",")
            )));
        }

        let mut sessions = self.shared.sessions.lock().unwrap();
        let state = Arc::new(SessionState::new(sessions.len() + 1));
        sessions.push(state.clone());

        Ok(Arc::new(MockSession {
            state,
            shared: self.shared.clone(),
        }))
    }
}

struct MockSession {
    state: Arc<SessionState>,
    shared: Arc<ClusterShared>,
}

#[async_trait]
impl StoreSession for MockSession {
    fn query(&self, statement: &str, values: Vec<Value>) -> Box<dyn StoreQuery> {
        Box::new(MockQuery {
            state: self.state.clone(),
            statement: statement.to_string(),
            values,
            settings: QuerySettings::default(),
        })
    }

    fn new_batch(&self, kind: BatchKind) -> Box<dyn StoreBatch> {
        Box::new(BatchStatements::new(kind))
    }

    async fn execute_batch(&self, batch: &dyn StoreBatch) -> StoreResult<()> {
        self.state
            .check(&format!("BATCH[{}] {:?}", batch.size(), batch.kind()))?;
        for entry in batch.entries() {
            self.state.check(&entry.statement)?;
        }
        Ok(())
    }

    async fn execute_batch_cas(&self, batch: &dyn StoreBatch) -> StoreResult<BatchCasOutcome> {
        self.execute_batch(batch).await?;
        let conflict = batch
            .entries()
            .iter()
            .any(|entry| entry.statement.contains("CONFLICT"));
        let previous = if conflict {
            Row::from([("range_id".to_string(), json!(41))])
        } else {
            Row::new()
        };
        Ok(BatchCasOutcome {
            applied: !conflict,
            previous,
            iter: Box::new(MockIter::new(self.state.clone(), Vec::new(), false)),
        })
    }

    async fn await_schema_agreement(&self) -> StoreResult<()> {
        self.state.check("SCHEMA AGREEMENT")?;
        if self.shared.schema_disagreement.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn close(&self) {
        self.state.close_calls.fetch_add(1, Ordering::SeqCst);
        self.state.closed.store(true, Ordering::SeqCst);
    }
}

struct MockQuery {
    state: Arc<SessionState>,
    statement: String,
    values: Vec<Value>,
    settings: QuerySettings,
}

impl MockQuery {
    fn record_settings(&self) {
        *self.state.last_settings.lock().unwrap() = Some(self.settings.clone());
    }
}

#[async_trait]
impl StoreQuery for MockQuery {
    fn set_consistency(&mut self, consistency: Consistency) {
        self.settings.consistency = Some(consistency);
    }

    fn set_serial_consistency(&mut self, consistency: SerialConsistency) {
        self.settings.serial_consistency = Some(consistency);
    }

    fn set_page_size(&mut self, page_size: usize) {
        self.settings.page_size = Some(page_size);
    }

    fn set_page_state(&mut self, state: Vec<u8>) {
        self.settings.page_state = Some(state);
    }

    fn set_timestamp(&mut self, micros: i64) {
        self.settings.timestamp = Some(micros);
    }

    fn set_idempotent(&mut self, idempotent: bool) {
        self.settings.idempotent = idempotent;
    }

    async fn exec(&mut self) -> StoreResult<()> {
        self.record_settings();
        self.state.check(&self.statement)
    }

    async fn map_scan(&mut self) -> StoreResult<Option<Row>> {
        self.record_settings();
        self.state.check(&self.statement)?;
        if self.statement.contains("MISSING") {
            return Ok(None);
        }
        Ok(Some(Row::from([
            ("session".to_string(), json!(self.state.number)),
            ("bound_values".to_string(), json!(self.values.len())),
        ])))
    }

    async fn map_scan_cas(&mut self) -> StoreResult<(bool, Row)> {
        self.record_settings();
        self.state.check(&self.statement)?;
        if self.statement.contains("CONFLICT") {
            Ok((false, Row::from([("range_id".to_string(), json!(41))])))
        } else {
            Ok((true, Row::new()))
        }
    }

    async fn iter(&mut self) -> StoreResult<Box<dyn RowIter>> {
        self.record_settings();
        self.state.check(&self.statement)?;
        let rows = (0..3)
            .map(|i| Row::from([("task_id".to_string(), json!(i))]))
            .collect();
        Ok(Box::new(MockIter::new(
            self.state.clone(),
            rows,
            self.statement.contains("PAGE_EXHAUST"),
        )))
    }
}

struct MockIter {
    state: Arc<SessionState>,
    rows: std::vec::IntoIter<Row>,
    fail_on_close: bool,
}

impl MockIter {
    fn new(state: Arc<SessionState>, rows: Vec<Row>, fail_on_close: bool) -> Self {
        Self {
            state,
            rows: rows.into_iter(),
            fail_on_close,
        }
    }
}

#[async_trait]
impl RowIter for MockIter {
    async fn next_row(&mut self) -> Option<Row> {
        self.rows.next()
    }

    fn page_state(&self) -> Option<Vec<u8>> {
        if self.rows.len() > 0 {
            Some(vec![self.state.number as u8, self.rows.len() as u8])
        } else {
            None
        }
    }

    async fn close(&mut self) -> StoreResult<()> {
        if self.fail_on_close {
            return Err(StoreError::ConnectionExhausted(format!(
                "session {} lost its connections while paging",
                self.state.number
            )));
        }
        Ok(())
    }
}
