//! Structured logging.
//!
//! Logs always go to stderr: stdout belongs to plugin output.

use crate::{LogFormat, TelemetryConfig, TelemetryError};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize the logging subsystem.
///
/// Sets up tracing-subscriber with either JSON or pretty format,
/// respecting the configured log level.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    // Build the env filter from RUST_LOG or config
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format {
        LogFormat::Json => init_json_logging(filter),
        LogFormat::Pretty => init_pretty_logging(filter),
    }
}

fn init_json_logging(filter: EnvFilter) -> Result<(), TelemetryError> {
    let json_layer = fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_current_span(true)
        .with_span_list(false)
        .with_file(false)
        .with_line_number(false)
        .flatten_event(true)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(json_layer)
        .try_init()
        .map_err(|e: tracing_subscriber::util::TryInitError| {
            TelemetryError::LoggingInit(e.to_string())
        })
}

fn init_pretty_logging(filter: EnvFilter) -> Result<(), TelemetryError> {
    let pretty_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(pretty_layer)
        .try_init()
        .map_err(|e: tracing_subscriber::util::TryInitError| {
            TelemetryError::LoggingInit(e.to_string())
        })
}

/// Standard log event names.
pub mod events {
    /// Compilation of an input file has started.
    pub const COMPILE_STARTED: &str = "compile_started";

    /// The input parsed into a document.
    pub const DOCUMENT_PARSED: &str = "document_parsed";

    /// `$ref` resolution finished.
    pub const REFERENCES_RESOLVED: &str = "references_resolved";

    /// A requested output was written.
    pub const OUTPUT_WRITTEN: &str = "output_written";

    /// A requested output could not be encoded or written.
    pub const OUTPUT_FAILED: &str = "output_failed";

    /// A plugin is about to run.
    pub const PLUGIN_INVOKED: &str = "plugin_invoked";

    /// A plugin run reported a failure.
    pub const PLUGIN_FAILED: &str = "plugin_failed";
}

/// Helper macros for structured logging with standard fields.
///
/// These wrap the tracing macros to ensure consistent field naming.
#[macro_export]
macro_rules! log_compile_started {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::COMPILE_STARTED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_document_parsed {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::DOCUMENT_PARSED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_references_resolved {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::REFERENCES_RESOLVED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_output_written {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::OUTPUT_WRITTEN,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_output_failed {
    ($($field:tt)*) => {
        tracing::error!(
            event = $crate::logging::events::OUTPUT_FAILED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_plugin_invoked {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::PLUGIN_INVOKED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_plugin_failed {
    ($($field:tt)*) => {
        tracing::error!(
            event = $crate::logging::events::PLUGIN_FAILED,
            $($field)*
        )
    };
}
