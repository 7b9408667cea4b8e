//! Logging initialization: human-readable lines (or JSON) on stderr, optionally teed to a file.
//!
//! Stdout is left to the console transport, so logs always go to stderr.

use std::fs::OpenOptions;
use std::io;
use std::sync::Arc;

use tracing_subscriber::{
    fmt::format::{FmtSpan, Writer},
    fmt::time::FormatTime,
    fmt::writer::{BoxMakeWriter, MakeWriterExt},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

/// Logging options chosen by the host.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    /// Emit JSON lines instead of plain text.
    pub json: bool,
    /// Default to `debug` level instead of `info` when `RUST_LOG` is not set.
    pub debug: bool,
    /// Also append log lines to this file.
    pub file: Option<String>,
}

/// Local time in `YYYY-MM-DD HH:MM:SS` for human-readable log lines.
struct ChronoLocal;

impl FormatTime for ChronoLocal {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let t = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        write!(w, "{} ", t)
    }
}

/// Initializes the global tracing subscriber.
///
/// Level comes from `RUST_LOG` when set, otherwise `info` (or `debug` with [`LogConfig::debug`]).
/// Load `.env` before calling.
pub fn init_tracing(config: &LogConfig) -> anyhow::Result<()> {
    let default_level = if config.debug { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let writer = match &config.file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            BoxMakeWriter::new(io::stderr.and(Arc::new(file)))
        }
        None => BoxMakeWriter::new(io::stderr),
    };

    let (json_layer, text_layer) = if config.json {
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_writer(writer);
        (Some(layer), None)
    } else {
        let event_format = tracing_subscriber::fmt::format()
            .with_timer(ChronoLocal)
            .with_level(true)
            .with_target(true)
            .with_thread_ids(false);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .event_format(event_format)
            .with_span_events(FmtSpan::NONE)
            .with_ansi(false);
        (None, Some(layer))
    };

    Registry::default()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set global subscriber: {}", e))?;

    tracing::debug!(
        json = config.json,
        file = config.file.as_deref().unwrap_or("-"),
        "logging initialized"
    );
    Ok(())
}
