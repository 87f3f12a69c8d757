use super::iter::Iter;
use super::manager::SessionManager;
use crate::driver::{Consistency, Row, SerialConsistency, StoreQuery};
use crate::error::StoreResult;

/// A statement bound to the session that was current when it was created.
///
/// Builder methods configure the statement; execution methods consume it and
/// report any failure back to the owning [`SessionManager`] before returning it.
pub struct Query {
    manager: SessionManager,
    inner: Box<dyn StoreQuery>,
}

impl Query {
    pub(crate) fn new(manager: SessionManager, inner: Box<dyn StoreQuery>) -> Self {
        Self { manager, inner }
    }

    pub fn consistency(mut self, consistency: Consistency) -> Self {
        self.inner.set_consistency(consistency);
        self
    }

    pub fn serial_consistency(mut self, consistency: SerialConsistency) -> Self {
        self.inner.set_serial_consistency(consistency);
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.inner.set_page_size(page_size);
        self
    }

    pub fn page_state(mut self, state: Vec<u8>) -> Self {
        self.inner.set_page_state(state);
        self
    }

    /// Write timestamp in microseconds since the epoch
    pub fn with_timestamp(mut self, micros: i64) -> Self {
        self.inner.set_timestamp(micros);
        self
    }

    pub fn idempotent(mut self, idempotent: bool) -> Self {
        self.inner.set_idempotent(idempotent);
        self
    }

    pub async fn exec(mut self) -> StoreResult<()> {
        let result = self.inner.exec().await;
        self.manager.observe(result)
    }

    pub async fn map_scan(mut self) -> StoreResult<Option<Row>> {
        let result = self.inner.map_scan().await;
        self.manager.observe(result)
    }

    /// Run a conditional statement. Returns `(applied, previous_row)`.
    pub async fn map_scan_cas(mut self) -> StoreResult<(bool, Row)> {
        let result = self.inner.map_scan_cas().await;
        self.manager.observe(result)
    }

    pub async fn iter(mut self) -> StoreResult<Iter> {
        let result = self.inner.iter().await;
        let rows = self.manager.observe(result)?;
        Ok(Iter::new(self.manager, rows))
    }
}
