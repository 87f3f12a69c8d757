//! # Storage Errors
//!
//! One error type for everything the session layer hands back to callers.
//! Connection-level failures (`Initialization`, `ConnectionExhausted`) are kept
//! apart from statement-level failures so the session manager can tell when the
//! whole pool is unusable instead of a single operation.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No session could be established with the storage cluster
    #[error("Session initialization error: {0}")]
    Initialization(String),

    /// The pool has no usable connections left
    #[error("No connections available: {0}")]
    ConnectionExhausted(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Invalid statement: {0}")]
    InvalidStatement(String),

    /// Not enough replicas acknowledged at the requested consistency level
    #[error("Consistency failure: {0}")]
    Consistency(String),

    /// The cluster cannot serve this key right now
    #[error("Cluster unavailable: {0}")]
    Unavailable(String),

    #[error("Driver error: {0}")]
    Driver(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// How the session manager reacts to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Pool-wide failure; the current session should be rebuilt
    ConnectionExhausted,
    /// Anything else; returned to the caller untouched
    Operation,
}

impl StoreError {
    pub fn classify(&self) -> FailureClass {
        match self {
            StoreError::ConnectionExhausted(_) => FailureClass::ConnectionExhausted,
            _ => FailureClass::Operation,
        }
    }

    pub fn is_connection_exhausted(&self) -> bool {
        self.classify() == FailureClass::ConnectionExhausted
    }

    /// True for failures where no session could serve the request at all.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            StoreError::Initialization(_) | StoreError::ConnectionExhausted(_)
        )
    }
}

impl From<::config::ConfigError> for StoreError {
    fn from(err: ::config::ConfigError) -> Self {
        StoreError::Configuration(err.to_string())
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
