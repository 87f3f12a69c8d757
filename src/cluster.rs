//! # Connection Builder
//!
//! Stateless construction of storage sessions. Every call resolves endpoints
//! afresh and asks the driver for a brand-new session, so the session manager
//! can rebuild simply by calling [`connect`] again.

use crate::config::StorageConfig;
use crate::driver::{ClusterConnector, Consistency, SerialConsistency, StoreSession};
use crate::error::{StoreError, StoreResult};
use crate::metrics;
use crate::resolver::EndpointResolver;
use opentelemetry::KeyValue;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Effective cluster topology and session settings handed to the driver
#[derive(Debug, Clone)]
pub struct ClusterSpec {
    pub hosts: Vec<String>,
    pub port: u16,
    pub keyspace: String,
    pub datacenter: Option<String>,
    pub consistency: Consistency,
    pub serial_consistency: SerialConsistency,
    pub connect_timeout: Duration,
    pub timeout: Duration,
    pub connections_per_host: u32,
    pub credentials: Option<Credentials>,
    pub tls_enabled: bool,
    pub disable_initial_host_lookup: bool,
}

/// Resolve configured hosts and assemble the driver-facing spec.
///
/// Host entries may hold comma-separated lists. Resolved endpoints are
/// deduplicated with their first-seen order preserved.
pub fn build_cluster_spec(
    config: &StorageConfig,
    resolver: &dyn EndpointResolver,
) -> StoreResult<ClusterSpec> {
    let mut hosts: Vec<String> = Vec::new();
    for host in config
        .hosts
        .iter()
        .flat_map(|entry| entry.split(','))
        .map(str::trim)
        .filter(|h| !h.is_empty())
    {
        for endpoint in resolver.resolve(host) {
            if !hosts.contains(&endpoint) {
                hosts.push(endpoint);
            }
        }
    }

    if hosts.is_empty() {
        return Err(StoreError::Configuration(
            "no storage endpoints resolved from configured hosts".to_string(),
        ));
    }

    let credentials = match (&config.user, &config.password) {
        (Some(username), password) => Some(Credentials {
            username: username.clone(),
            password: password.clone().unwrap_or_default(),
        }),
        (None, _) => None,
    };

    Ok(ClusterSpec {
        hosts,
        port: config.port,
        keyspace: config.keyspace.clone(),
        datacenter: config.datacenter.clone(),
        consistency: config.consistency,
        serial_consistency: config.serial_consistency,
        connect_timeout: config.connect_timeout(),
        timeout: config.timeout(),
        connections_per_host: config.connections_per_host,
        credentials,
        tls_enabled: config.tls_enabled,
        disable_initial_host_lookup: config.disable_initial_host_lookup,
    })
}

/// Build one live session, bounded by `init_timeout`.
///
/// Any failure is reported as [`StoreError::Initialization`] (configuration
/// problems keep their own variant).
pub async fn connect(
    config: &StorageConfig,
    resolver: &dyn EndpointResolver,
    connector: &dyn ClusterConnector,
) -> StoreResult<Arc<dyn StoreSession>> {
    let start = Instant::now();
    metrics::session_init_requests_total().add(1, &[]);

    let result = establish(config, resolver, connector).await;

    metrics::session_init_duration().record(start.elapsed().as_secs_f64() * 1000.0, &[]);
    if let Err(err) = &result {
        let error_type = match err {
            StoreError::Configuration(_) => "configuration",
            StoreError::Timeout(_) => "timeout",
            _ => "initialization",
        };
        metrics::session_init_failures_total().add(1, &[KeyValue::new("error_type", error_type)]);
        error!(error = %err, "❌ Storage session initialization failed");
    }

    result.map_err(|err| match err {
        StoreError::Configuration(_) | StoreError::Initialization(_) => err,
        other => StoreError::Initialization(other.to_string()),
    })
}

async fn establish(
    config: &StorageConfig,
    resolver: &dyn EndpointResolver,
    connector: &dyn ClusterConnector,
) -> StoreResult<Arc<dyn StoreSession>> {
    let spec = build_cluster_spec(config, resolver)?;

    info!(
        hosts = ?spec.hosts,
        port = spec.port,
        keyspace = %spec.keyspace,
        datacenter = ?spec.datacenter,
        consistency = ?spec.consistency,
        serial_consistency = ?spec.serial_consistency,
        connections_per_host = spec.connections_per_host,
        authenticated = spec.credentials.is_some(),
        tls = spec.tls_enabled,
        "🔌 Connecting storage session"
    );

    let init_timeout = config.init_timeout();
    match tokio::time::timeout(init_timeout, connector.connect(&spec)).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(format!(
            "session not established within {}ms",
            init_timeout.as_millis()
        ))),
    }
}
