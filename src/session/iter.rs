use super::manager::SessionManager;
use crate::driver::{Row, RowIter};
use crate::error::StoreResult;

/// Result cursor. Errors met while paging surface from [`Iter::close`].
pub struct Iter {
    manager: SessionManager,
    inner: Box<dyn RowIter>,
}

impl Iter {
    pub(crate) fn new(manager: SessionManager, inner: Box<dyn RowIter>) -> Self {
        Self { manager, inner }
    }

    pub async fn next_row(&mut self) -> Option<Row> {
        self.inner.next_row().await
    }

    pub fn page_state(&self) -> Option<Vec<u8>> {
        self.inner.page_state()
    }

    pub async fn close(mut self) -> StoreResult<()> {
        let result = self.inner.close().await;
        self.manager.observe(result)
    }
}
