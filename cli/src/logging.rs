use std::path::PathBuf;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initializes logging for bootcamp-admin.
///
/// Console output is compact and human-readable. File output is JSON, rotated daily, in
/// the `logs` directory under the application data dir (falls back to `./logs`).
///
/// RUST_LOG overrides the default filter:
/// - RUST_LOG=debug bootcamp-admin delete 1
/// - RUST_LOG=service=trace,capability_client=debug bootcamp-admin delete 1
///
/// The returned guard must be kept alive; dropping it stops file logging.
pub fn init_logging() -> tracing_appender::non_blocking::WorkerGuard {
    let log_dir = database::database_path::get_default_data_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("logs");

    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!(
            "Warning: Failed to create log directory at {}: {}",
            log_dir.display(),
            e
        );
    }

    // stderr keeps stdout clean for JSON output of the metrics command
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .compact();

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "bootcamp-admin.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_file(true)
        .with_line_number(true);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,service=debug,database=info,capability_client=info")
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    guard
}
