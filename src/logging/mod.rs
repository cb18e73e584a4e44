//! Structured logging for the alignment pipeline
//!
//! Console and rolling-file output through `tracing-subscriber`, plus a
//! per-run correlation id attached to alignment spans.

pub mod config;

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};
use uuid::Uuid;

pub use config::LoggingConfig;

thread_local! {
    static CORRELATION_ID: std::cell::RefCell<Option<Uuid>> = const { std::cell::RefCell::new(None) };
}

/// Initialize the global subscriber.
///
/// Keep the returned guard alive for as long as file output is wanted.
/// Calling this again after a subscriber is installed logs a warning and
/// leaves the first subscriber in place.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    config.validate().map_err(anyhow::Error::msg)?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.directive()));

    let mut layers = Vec::new();
    let mut guard = None;

    if config.console_output {
        let console_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(config.include_file_location)
            .with_file(config.include_file_location);
        layers.push(console_layer.boxed());
    }

    if let Some(ref log_dir) = config.log_directory {
        let file_appender = tracing_appender::rolling::daily(log_dir, "alignment.log");
        let (non_blocking, worker_guard) = tracing_appender::non_blocking(file_appender);
        guard = Some(worker_guard);

        let file_layer = fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .json();
        layers.push(file_layer.boxed());
    }

    if let Err(e) = tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init()
    {
        tracing::warn!("logging already initialized: {}", e);
        return Ok(guard);
    }

    tracing::info!("Logging system initialized with config: {:?}", config);
    Ok(guard)
}

/// Set a correlation ID for the current thread
pub fn set_correlation_id(id: Uuid) {
    CORRELATION_ID.with(|correlation_id| {
        *correlation_id.borrow_mut() = Some(id);
    });
}

/// Get the current correlation ID for this thread
pub fn get_correlation_id() -> Option<Uuid> {
    CORRELATION_ID.with(|correlation_id| *correlation_id.borrow())
}

/// Generate a new correlation ID and set it for the current thread
pub fn new_correlation_id() -> Uuid {
    let id = Uuid::new_v4();
    set_correlation_id(id);
    id
}

/// Clear the correlation ID for the current thread
pub fn clear_correlation_id() {
    CORRELATION_ID.with(|correlation_id| {
        *correlation_id.borrow_mut() = None;
    });
}

/// Create a span with correlation ID automatically included
#[macro_export]
macro_rules! correlation_span {
    ($level:expr, $name:expr) => {
        if let Some(correlation_id) = $crate::logging::get_correlation_id() {
            tracing::span!($level, $name, correlation_id = %correlation_id)
        } else {
            tracing::span!($level, $name)
        }
    };
    ($level:expr, $name:expr, $($field:tt)*) => {
        if let Some(correlation_id) = $crate::logging::get_correlation_id() {
            tracing::span!($level, $name, correlation_id = %correlation_id, $($field)*)
        } else {
            tracing::span!($level, $name, $($field)*)
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_correlation_id_management() {
        clear_correlation_id();
        assert!(get_correlation_id().is_none());

        let id = new_correlation_id();
        assert_eq!(get_correlation_id(), Some(id));

        clear_correlation_id();
        assert!(get_correlation_id().is_none());
    }

    #[test]
    fn test_logging_init_is_repeatable() {
        let temp_dir = TempDir::new().unwrap();
        let config = LoggingConfig {
            global_level: "debug".to_string(),
            console_output: true,
            log_directory: Some(temp_dir.path().to_path_buf()),
            include_file_location: false,
        };

        let guard = init_logging(&config).unwrap();
        assert!(guard.is_some());
        assert!(init_logging(&LoggingConfig::default()).is_ok());
    }

    #[test]
    fn test_logging_init_rejects_bad_level() {
        let config = LoggingConfig {
            global_level: "verbose".to_string(),
            ..LoggingConfig::default()
        };
        assert!(init_logging(&config).is_err());
    }
}
