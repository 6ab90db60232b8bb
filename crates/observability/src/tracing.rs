//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Initialize tracing/logging for the process.
///
/// JSON output by default (log pipelines), human-readable when
/// `DEALDESK_LOG_PRETTY` is set. Safe to call multiple times (subsequent
/// calls are no-ops).
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false);

    if std::env::var_os("DEALDESK_LOG_PRETTY").is_some() {
        let _ = builder.try_init();
    } else {
        let _ = builder.json().try_init();
    }
}
