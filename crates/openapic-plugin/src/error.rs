use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

/// Failures while invoking a plugin.
///
/// None of these abort compilation; the dispatcher reports them and still
/// forwards whatever response it could decode.
#[derive(Debug, Error)]
pub enum PluginError {
    /// No `openapi_<name>` executable on the search path.
    #[error("plugin '{name}' not found: no executable named '{executable}' on the search path")]
    NotFound { name: String, executable: String },

    /// The plugin exited unsuccessfully.
    #[error("plugin '{name}' failed ({status}){}", format_stderr(.stderr))]
    ExecutionFailed {
        name: String,
        status: ExitStatus,
        stderr: String,
    },

    /// The plugin's stdout is not a valid response message.
    #[error("plugin '{name}' returned an invalid response: {source}")]
    Protocol {
        name: String,
        #[source]
        source: prost::DecodeError,
    },

    /// The plugin did not finish in time and was killed.
    #[error("plugin '{name}' timed out after {}s", .timeout.as_secs_f64())]
    TimedOut { name: String, timeout: Duration },

    /// Spawning the plugin or talking to it over its pipes failed.
    #[error("plugin '{name}' I/O error ({}): {source}", .executable.display())]
    Io {
        name: String,
        executable: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A request wrapper carries a payload version this build cannot read.
    #[error("unsupported wrapper version '{version}' for '{name}'")]
    UnsupportedWrapper { name: String, version: String },

    /// A request wrapper's payload is not a valid document.
    #[error("wrapper '{name}' does not contain a valid document: {source}")]
    InvalidWrapper {
        name: String,
        #[source]
        source: prost::DecodeError,
    },
}

fn format_stderr(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}
