use crate::constants::{
    DEFAULT_CONNECTIONS_PER_HOST, DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_PORT, DEFAULT_TIMEOUT_MS,
    ENV_PREFIX, SESSION_REFRESH_MIN_INTERVAL,
};
use crate::driver::{Consistency, SerialConsistency};
use crate::error::{StoreError, StoreResult};
use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Connection settings for the storage cluster.
///
/// Loaded from an optional TOML file and then overridden from
/// `TASKER_STORAGE_*` environment variables, e.g. `TASKER_STORAGE_KEYSPACE` or
/// `TASKER_STORAGE_HOSTS=10.0.0.1,10.0.0.2`.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub hosts: Vec<String>,
    pub port: u16,
    pub keyspace: String,
    pub datacenter: Option<String>,
    pub user: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub consistency: Consistency,
    pub serial_consistency: SerialConsistency,
    pub connect_timeout_ms: u64,
    pub timeout_ms: u64,
    /// Upper bound for building a whole session, including topology discovery
    pub init_timeout_ms: u64,
    pub connections_per_host: u32,
    pub refresh_min_interval_ms: u64,
    pub tls_enabled: bool,
    pub disable_initial_host_lookup: bool,
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("hosts", &self.hosts)
            .field("port", &self.port)
            .field("keyspace", &self.keyspace)
            .field("datacenter", &self.datacenter)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("consistency", &self.consistency)
            .field("serial_consistency", &self.serial_consistency)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("timeout_ms", &self.timeout_ms)
            .field("init_timeout_ms", &self.init_timeout_ms)
            .field("connections_per_host", &self.connections_per_host)
            .field("refresh_min_interval_ms", &self.refresh_min_interval_ms)
            .field("tls_enabled", &self.tls_enabled)
            .field(
                "disable_initial_host_lookup",
                &self.disable_initial_host_lookup,
            )
            .finish()
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            hosts: vec!["127.0.0.1".to_string()],
            port: DEFAULT_PORT,
            keyspace: "tasker".to_string(),
            datacenter: None,
            user: None,
            password: None,
            consistency: Consistency::LocalQuorum,
            serial_consistency: SerialConsistency::LocalSerial,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            init_timeout_ms: DEFAULT_TIMEOUT_MS,
            connections_per_host: DEFAULT_CONNECTIONS_PER_HOST,
            refresh_min_interval_ms: SESSION_REFRESH_MIN_INTERVAL.as_millis() as u64,
            tls_enabled: false,
            disable_initial_host_lookup: false,
        }
    }
}

impl StorageConfig {
    /// Load configuration from `path` (if given) and the environment, then validate.
    pub fn load(path: Option<&Path>) -> StoreResult<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("hosts")
                .try_parsing(true),
        );

        let config: StorageConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Configuration from the environment alone.
    pub fn from_env() -> StoreResult<Self> {
        Self::load(None)
    }

    pub fn validate(&self) -> StoreResult<()> {
        if self.hosts.iter().all(|h| h.trim().is_empty()) {
            return Err(StoreError::Configuration(
                "at least one storage host is required".to_string(),
            ));
        }
        if self.port == 0 {
            return Err(StoreError::Configuration("port must be non-zero".to_string()));
        }
        if self.keyspace.trim().is_empty() {
            return Err(StoreError::Configuration("keyspace is required".to_string()));
        }
        if self.connections_per_host == 0 {
            return Err(StoreError::Configuration(
                "connections_per_host must be at least 1".to_string(),
            ));
        }
        if self.connect_timeout_ms == 0 || self.init_timeout_ms == 0 {
            return Err(StoreError::Configuration(
                "connect_timeout_ms and init_timeout_ms must be non-zero".to_string(),
            ));
        }
        if self.password.is_some() && self.user.is_none() {
            return Err(StoreError::Configuration(
                "password given without user".to_string(),
            ));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn init_timeout(&self) -> Duration {
        Duration::from_millis(self.init_timeout_ms)
    }

    pub fn refresh_min_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_min_interval_ms)
    }
}
