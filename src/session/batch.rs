use super::manager::SessionManager;
use crate::driver::{BatchKind, StoreBatch, Value};
use crate::error::StoreResult;

/// Statements grouped for a single round trip.
///
/// Execution goes through the manager's current session at call time, not the
/// session the batch was created from.
pub struct Batch {
    manager: SessionManager,
    inner: Box<dyn StoreBatch>,
}

impl Batch {
    pub(crate) fn new(manager: SessionManager, inner: Box<dyn StoreBatch>) -> Self {
        Self { manager, inner }
    }

    pub fn query(&mut self, statement: &str, values: Vec<Value>) -> &mut Self {
        self.inner.add(statement, values);
        self
    }

    pub fn with_timestamp(mut self, micros: i64) -> Self {
        self.inner.set_timestamp(micros);
        self
    }

    pub fn kind(&self) -> BatchKind {
        self.inner.kind()
    }

    pub fn size(&self) -> usize {
        self.inner.size()
    }

    pub async fn execute(&self) -> StoreResult<()> {
        self.manager.execute_batch(self).await
    }

    pub(crate) fn driver_batch(&self) -> &dyn StoreBatch {
        self.inner.as_ref()
    }
}
