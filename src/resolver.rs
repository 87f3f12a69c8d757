//! # Endpoint Resolution
//!
//! Turns the logical host names found in configuration into the concrete
//! addresses handed to the storage driver. Service discovery lives outside this
//! crate; it plugs in through [`EndpointResolver`].

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;

/// Resolves a logical host into one or more concrete endpoints.
///
/// Implementations must be cheap to call: the connection builder invokes the
/// resolver on every session (re)initialization.
pub trait EndpointResolver: Send + Sync + fmt::Debug {
    fn resolve(&self, host: &str) -> Vec<String>;
}

/// Returns every host unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopResolver;

impl EndpointResolver for NoopResolver {
    fn resolve(&self, host: &str) -> Vec<String> {
        vec![host.to_string()]
    }
}

/// Fixed lookup table of logical names to endpoints.
///
/// Unknown names resolve to themselves. The table may be updated at runtime,
/// which only affects subsequent session builds.
#[derive(Debug, Default)]
pub struct StaticResolver {
    table: RwLock<HashMap<String, Vec<String>>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(self, name: impl Into<String>, endpoints: Vec<String>) -> Self {
        self.set(name, endpoints);
        self
    }

    pub fn set(&self, name: impl Into<String>, endpoints: Vec<String>) {
        self.table.write().insert(name.into(), endpoints);
    }

    pub fn remove(&self, name: &str) -> Option<Vec<String>> {
        self.table.write().remove(name)
    }
}

impl EndpointResolver for StaticResolver {
    fn resolve(&self, host: &str) -> Vec<String> {
        match self.table.read().get(host) {
            Some(endpoints) if !endpoints.is_empty() => endpoints.clone(),
            _ => vec![host.to_string()],
        }
    }
}
