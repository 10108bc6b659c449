//! Logging setup shared by the backend binaries.
//!
//! Every crate logs through `tracing`; this module installs the subscriber
//! once per process, optionally mirroring output into a daily rolling file.

use booking_config::LoggingConfig;
use std::str::FromStr;
use tracing::{info, warn, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber with a specific log level.
///
/// `RUST_LOG` directives are honoured; the `booking` crates are raised to
/// `level`. Calling this twice is harmless.
fn init_with_level(level: Level) {
    let result = tracing_subscriber::registry()
        .with(console_layer())
        .with(filter_for(level))
        .try_init();

    if result.is_ok() {
        info!("Logging initialized at level: {}", level);
    }
}

/// Initialize logging from the `logging` config section.
///
/// The returned guard flushes the file writer on drop and must be kept alive
/// for the lifetime of the process.
pub fn init_from_config(config: &LoggingConfig) -> Option<WorkerGuard> {
    let level = Level::from_str(&config.level).unwrap_or(Level::INFO);

    let Some(directory) = config.directory.as_deref() else {
        init_with_level(level);
        return None;
    };

    let appender = tracing_appender::rolling::daily(directory, &config.file_prefix);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let result = tracing_subscriber::registry()
        .with(console_layer())
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .with(filter_for(level))
        .try_init();

    match result {
        Ok(()) => {
            info!(
                "Logging initialized at level {} (file output in {})",
                level, directory
            );
            Some(guard)
        }
        Err(e) => {
            warn!("Logging was already initialized: {}", e);
            None
        }
    }
}

fn filter_for(level: Level) -> EnvFilter {
    let filter = EnvFilter::from_default_env();
    match format!("booking={}", level).parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

fn console_layer<S>() -> impl tracing_subscriber::Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_thread_names(true)
}
