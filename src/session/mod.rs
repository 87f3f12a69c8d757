//! # Storage Sessions
//!
//! [`SessionManager`] owns the live connection pool and hands out per-call
//! [`Query`], [`Batch`] and [`Iter`] wrappers. Each wrapper reports its error
//! outcome back to the manager, which rebuilds the pool when the driver says it
//! has no usable connections left.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tasker_persistence::driver::{ClusterConnector, Value};
//! use tasker_persistence::{NoopResolver, SessionManager, StorageConfig};
//!
//! # async fn example(connector: Arc<dyn ClusterConnector>) -> Result<(), Box<dyn std::error::Error>> {
//! let config = StorageConfig::from_env()?;
//! let manager = SessionManager::new(config, Arc::new(NoopResolver), connector).await?;
//!
//! manager
//!     .query(
//!         "UPDATE executions SET state = ? WHERE shard_id = ?",
//!         vec![Value::from("running"), Value::from(7)],
//!     )
//!     .exec()
//!     .await?;
//!
//! manager.close().await;
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod handle;
pub mod iter;
pub mod manager;
pub mod query;
pub mod stats;

pub use batch::Batch;
pub use handle::SessionHandle;
pub use iter::Iter;
pub use manager::{CasResult, RefreshOutcome, SessionManager};
pub use query::Query;
pub use stats::{SessionStats, SessionStatsSnapshot};
