use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};

pub const LOG_DIR_ENV: &str = "PROMPRINT_LOG_DIR";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const LOG_FILE_NAME: &str = "promprint-cleaning.log";

/// Initializes logging with a JSON file layer and a console layer.
///
/// The file gets everything at `info` (or `RUST_LOG`); the console only shows
/// warnings unless `debug` is set. Keep the returned guard alive until exit
/// so buffered file output is flushed.
pub fn init_logging(debug: bool) -> WorkerGuard {
    let log_dir = std::env::var(LOG_DIR_ENV).unwrap_or_else(|_| DEFAULT_LOG_DIR.to_string());
    let _ = fs::create_dir_all(&log_dir);

    // One log per run: drop the previous run's file
    let _ = fs::remove_file(Path::new(&log_dir).join(LOG_FILE_NAME));
    let file_appender = tracing_appender::rolling::never(&log_dir, LOG_FILE_NAME);
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("promprint_cleaning=info"));
    let file_layer = fmt::layer()
        .json()
        .with_writer(non_blocking_writer)
        .with_filter(file_filter);

    let console_level = if debug {
        LevelFilter::INFO
    } else {
        LevelFilter::WARN
    };
    let console_layer = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_filter(console_level);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .init();

    guard
}
