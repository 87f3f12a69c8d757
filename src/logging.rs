//! # Structured Logging Module
//!
//! Environment-aware structured logging to the console and a JSON log file, so
//! session refreshes can be correlated across service roles after the fact.

use chrono::Utc;
use std::fs;
use std::path::PathBuf;
use std::process;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging once per process.
///
/// `RUST_LOG` overrides the environment-derived level. If another subscriber is
/// already installed (e.g. by the host process) it is left in place.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| get_log_level(&environment));

        let console_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_level(true)
            .with_ansi(true)
            .with_filter(EnvFilter::new(log_level.clone()));

        let log_dir = PathBuf::from("log");
        let file_layer = match fs::create_dir_all(&log_dir) {
            Ok(()) => {
                let log_filename = format!(
                    "{}.{}.{}.log",
                    environment,
                    process::id(),
                    Utc::now().format("%Y%m%d_%H%M%S")
                );
                let file_appender = tracing_appender::rolling::never(&log_dir, log_filename);
                let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
                // Flushes on drop; must live for the whole process
                std::mem::forget(guard);

                Some(
                    fmt::layer()
                        .with_writer(file_writer)
                        .with_target(true)
                        .with_thread_ids(true)
                        .with_level(true)
                        .with_ansi(false)
                        .json()
                        .with_filter(EnvFilter::new(log_level)),
                )
            }
            Err(_) => None,
        };
        let file_enabled = file_layer.is_some();

        if tracing_subscriber::registry()
            .with(console_layer)
            .with(file_layer)
            .try_init()
            .is_err()
        {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            pid = process::id(),
            environment = %environment,
            file_output = file_enabled,
            "🔧 STRUCTURED LOGGING: Initialized"
        );
    });
}

fn get_environment() -> String {
    std::env::var("TASKER_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

fn get_log_level(environment: &str) -> String {
    match environment {
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

/// Log a session lifecycle event (start, refresh, close)
pub fn log_session_operation(
    operation: &str,
    generation: u64,
    status: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        generation = generation,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "💾 SESSION_OPERATION"
    );
}
