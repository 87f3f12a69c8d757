//! # Storage Driver Interface
//!
//! The storage cluster's wire protocol is not implemented here. A driver plugs
//! in through [`ClusterConnector`], which produces [`StoreSession`] values; the
//! session manager owns those and never hands them to callers directly.
//!
//! Drivers must report a pool with no usable connections as
//! [`StoreError::ConnectionExhausted`](crate::StoreError::ConnectionExhausted);
//! that is the only error that makes the manager rebuild its session.

use crate::cluster::ClusterSpec;
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Column value as exchanged with the driver
pub type Value = serde_json::Value;

/// One result row keyed by column name
pub type Row = HashMap<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum Consistency {
    Any,
    One,
    Two,
    Three,
    Quorum,
    All,
    LocalQuorum,
    EachQuorum,
    LocalOne,
}

impl FromStr for Consistency {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "any" => Ok(Consistency::Any),
            "one" => Ok(Consistency::One),
            "two" => Ok(Consistency::Two),
            "three" => Ok(Consistency::Three),
            "quorum" => Ok(Consistency::Quorum),
            "all" => Ok(Consistency::All),
            "localquorum" => Ok(Consistency::LocalQuorum),
            "eachquorum" => Ok(Consistency::EachQuorum),
            "localone" => Ok(Consistency::LocalOne),
            _ => Err(StoreError::Configuration(format!(
                "unknown consistency level: {s}"
            ))),
        }
    }
}

impl TryFrom<String> for Consistency {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Consistency used for the Paxos phase of lightweight transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum SerialConsistency {
    Serial,
    LocalSerial,
}

impl FromStr for SerialConsistency {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "serial" => Ok(SerialConsistency::Serial),
            "localserial" => Ok(SerialConsistency::LocalSerial),
            _ => Err(StoreError::Configuration(format!(
                "unknown serial consistency level: {s}"
            ))),
        }
    }
}

impl TryFrom<String> for SerialConsistency {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// Accepts `local_quorum`, `LOCAL_QUORUM`, `LocalQuorum` and `local-quorum`
fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchKind {
    Logged,
    Unlogged,
    Counter,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchEntry {
    pub statement: String,
    pub values: Vec<Value>,
}

/// Plain statement list that drivers can use as their batch representation.
#[derive(Debug, Clone)]
pub struct BatchStatements {
    kind: BatchKind,
    entries: Vec<BatchEntry>,
    timestamp: Option<i64>,
}

impl BatchStatements {
    pub fn new(kind: BatchKind) -> Self {
        Self {
            kind,
            entries: Vec::new(),
            timestamp: None,
        }
    }
}

/// A batch under construction, obtained from a [`StoreSession`].
pub trait StoreBatch: Send + Sync {
    fn kind(&self) -> BatchKind;
    fn add(&mut self, statement: &str, values: Vec<Value>);
    fn set_timestamp(&mut self, micros: i64);
    fn timestamp(&self) -> Option<i64>;
    fn entries(&self) -> &[BatchEntry];

    fn size(&self) -> usize {
        self.entries().len()
    }
}

impl StoreBatch for BatchStatements {
    fn kind(&self) -> BatchKind {
        self.kind
    }

    fn add(&mut self, statement: &str, values: Vec<Value>) {
        self.entries.push(BatchEntry {
            statement: statement.to_string(),
            values,
        });
    }

    fn set_timestamp(&mut self, micros: i64) {
        self.timestamp = Some(micros);
    }

    fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }

    fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }
}

/// Cursor over a (possibly paged) result set
#[async_trait]
pub trait RowIter: Send {
    async fn next_row(&mut self) -> Option<Row>;

    /// Opaque paging token for resuming after the current page
    fn page_state(&self) -> Option<Vec<u8>>;

    /// Releases the cursor and reports any error met while paging
    async fn close(&mut self) -> StoreResult<()>;
}

/// A single statement bound to its values, ready for execution.
#[async_trait]
pub trait StoreQuery: Send {
    fn set_consistency(&mut self, consistency: Consistency);
    fn set_serial_consistency(&mut self, consistency: SerialConsistency);
    fn set_page_size(&mut self, page_size: usize);
    fn set_page_state(&mut self, state: Vec<u8>);
    fn set_timestamp(&mut self, micros: i64);
    fn set_idempotent(&mut self, idempotent: bool);

    async fn exec(&mut self) -> StoreResult<()>;

    /// First row of the result, if any
    async fn map_scan(&mut self) -> StoreResult<Option<Row>>;

    /// Executes a conditional statement; returns whether it was applied and,
    /// when it was not, the row that blocked it
    async fn map_scan_cas(&mut self) -> StoreResult<(bool, Row)>;

    async fn iter(&mut self) -> StoreResult<Box<dyn RowIter>>;
}

/// Result of a conditional batch as reported by the driver
pub struct BatchCasOutcome {
    pub applied: bool,
    pub previous: Row,
    pub iter: Box<dyn RowIter>,
}

/// One live pool of connections to the storage cluster.
#[async_trait]
pub trait StoreSession: Send + Sync {
    fn query(&self, statement: &str, values: Vec<Value>) -> Box<dyn StoreQuery>;

    fn new_batch(&self, kind: BatchKind) -> Box<dyn StoreBatch>;

    async fn execute_batch(&self, batch: &dyn StoreBatch) -> StoreResult<()>;

    async fn execute_batch_cas(&self, batch: &dyn StoreBatch) -> StoreResult<BatchCasOutcome>;

    async fn await_schema_agreement(&self) -> StoreResult<()>;

    /// Closes every connection in the pool. In-flight operations may fail.
    async fn close(&self);
}

/// Opens sessions against a cluster. Holds no per-session state.
#[async_trait]
pub trait ClusterConnector: Send + Sync + fmt::Debug {
    async fn connect(&self, spec: &ClusterSpec) -> StoreResult<Arc<dyn StoreSession>>;
}
