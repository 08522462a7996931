use tracing_log::LogTracer;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;

/// Initializes tracing from the logging config. `format` selects between
/// human-readable console output and JSON lines; `level` seeds the filter
/// unless RUST_LOG overrides it.
pub fn init_logging(config: &LoggingConfig) {
    // Route log-crate records from dependencies into tracing.
    let _ = LogTracer::init();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));

    match config.format.as_str() {
        "json" => {
            let subscriber = tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_current_span(false));
            let _ = tracing::subscriber::set_global_default(subscriber);
        }
        _ => {
            let subscriber = tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer());
            let _ = tracing::subscriber::set_global_default(subscriber);
        }
    }
}
