//! Shared helpers for storage session integration tests
#![allow(dead_code)]

pub mod mock_driver;

pub use mock_driver::*;

use std::sync::Arc;
use std::time::Duration;
use tasker_persistence::{NoopResolver, SessionManager, StorageConfig};

pub fn test_config() -> StorageConfig {
    StorageConfig {
        hosts: vec!["storage-seed-0".to_string(), "storage-seed-1".to_string()],
        keyspace: "tasker_test".to_string(),
        ..Default::default()
    }
}

pub fn config_with_refresh_interval(interval: Duration) -> StorageConfig {
    StorageConfig {
        refresh_min_interval_ms: interval.as_millis() as u64,
        ..test_config()
    }
}

pub async fn start_manager(cluster: &MockCluster, config: StorageConfig) -> SessionManager {
    SessionManager::new(config, Arc::new(NoopResolver), Arc::new(cluster.clone()))
        .await
        .expect("manager should start against the mock cluster")
}

const MAX_YIELDS: usize = 10_000;

/// Yield until `condition` holds. Does not advance a paused clock.
pub async fn yield_until(description: &str, mut condition: impl FnMut() -> bool) {
    for _ in 0..MAX_YIELDS {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition never reached: {description}");
}

/// Wait for spawned refresh runs triggered by operation failures to finish.
pub async fn wait_for_refreshes(manager: &SessionManager, completed: u64) {
    yield_until("refresh runs completed", || {
        manager.stats().completed_refreshes() >= completed
    })
    .await;
}
