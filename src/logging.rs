//! # Structured Logging Module
//!
//! Environment-aware structured logging for the production engine. Output is
//! plain text for terminals or JSON lines for log shippers, selected by
//! [`LoggingConfig::json`].

use chrono::Utc;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};
use uuid::Uuid;

use crate::config::{ConfigLoader, LoggingConfig};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging once per process.
///
/// `RUST_LOG` takes precedence over the configured level. If another global
/// subscriber is already installed, it is left in place.
pub fn init_structured_logging(config: &LoggingConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(level_for(&environment, &config.level)));

        let layer = if config.json {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(false)
                .json()
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(true)
                .with_filter(filter)
                .boxed()
        };

        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            environment = %environment,
            json = config.json,
            "🔧 STRUCTURED LOGGING: Initialized"
        );
    });
}

/// Get current environment from `SHOPFLOOR_ENV`
fn get_environment() -> String {
    ConfigLoader::detect_environment()
}

/// Configured level, or the environment's default when none is set
fn level_for(environment: &str, configured: &str) -> String {
    if !configured.trim().is_empty() {
        return configured.to_string();
    }
    match environment {
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

/// Log structured data for timer events
pub fn log_timer_event(
    action: &str,
    operator_id: Uuid,
    operation_id: Uuid,
    time_entry_id: Uuid,
    details: &str,
) {
    tracing::info!(
        action = %action,
        operator_id = %operator_id,
        operation_id = %operation_id,
        time_entry_id = %time_entry_id,
        details = %details,
        timestamp = %Utc::now().to_rfc3339(),
        "⏱️ TIMER_EVENT"
    );
}
