//! # feedbackloop-logging
//!
//! Logging and flat-file records for feedbackloop.
//!
//! ## Key Types
//!
//! - [`Logger`] - Structured session event logging
//! - [`LogEvent`] - Session event types
//! - [`LogFormat`] - Output formats (Pretty, JSON, Compact)
//! - [`TranscriptWriter`] - Append-only chat transcript
//! - [`FeedbackWriter`] - Append-only feedback log
//! - [`parse_feedback_log`] - Reads feedback blocks back
//!
//! ## Log Formats
//!
//! - `Pretty` - Human-readable colored output, only for events worth interrupting a chat
//! - `JSON` - Structured JSON lines
//! - `Compact` - Minimal text output

mod events;
mod records;

pub use events::{LogEvent, LogFormat, Logger};
pub use records::{
    format_exchange, format_feedback_block, parse_feedback_log, read_feedback_log,
    FeedbackRecord, FeedbackStats, FeedbackWriter, RecordError, TranscriptWriter,
    FEEDBACK_SEPARATOR, TIMESTAMP_FORMAT,
};

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing for the application.
///
/// `RUST_LOG` takes precedence over `level`. When `trace_dir` is given, a
/// daily-rolling JSON trace file is written there as well; keep the returned
/// guard alive for the life of the process so buffered lines get flushed.
pub fn init_tracing(
    level: &str,
    format: LogFormat,
    trace_dir: Option<&Path>,
) -> std::io::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard) = match trace_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("feedbackloop")
                .filename_suffix("log")
                .build(dir)
                .map_err(std::io::Error::other)?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_target(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let console_layer = match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Pretty | LogFormat::Compact => fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}
