//! Compiler configuration.
//!
//! Built once from the command line and then only read.

use std::path::PathBuf;
use std::time::Duration;

use openapic_plugin::PluginDispatcher;

use crate::pipeline::CompileOptions;
use crate::serializer::{Encoding, OutputRequest};

/// Everything one compiler run needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerConfig {
    /// Input document.
    pub input: PathBuf,
    /// YAML text output.
    pub text_out: Option<PathBuf>,
    /// JSON output.
    pub json_out: Option<PathBuf>,
    /// Protobuf output.
    pub pb_out: Option<PathBuf>,
    /// Where diagnostics are persisted.
    pub errors_out: Option<PathBuf>,
    /// Resolve `$ref` nodes (default: true).
    pub resolve_references: bool,
    /// Plugin to run after compilation.
    pub plugin: Option<String>,
    /// Kill the plugin after this long. No limit when unset.
    pub plugin_timeout: Option<Duration>,
}

impl CompilerConfig {
    /// Configuration for `input` with no outputs and reference resolution on.
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            text_out: None,
            json_out: None,
            pb_out: None,
            errors_out: None,
            resolve_references: true,
            plugin: None,
            plugin_timeout: None,
        }
    }

    /// Requested outputs, in text, JSON, binary order.
    pub fn outputs(&self) -> Vec<OutputRequest> {
        [
            (Encoding::Text, &self.text_out),
            (Encoding::Json, &self.json_out),
            (Encoding::Binary, &self.pb_out),
        ]
        .into_iter()
        .filter_map(|(encoding, path)| {
            path.as_ref()
                .map(|path| OutputRequest::new(encoding, path.clone()))
        })
        .collect()
    }

    /// True if at least one output, error file or plugin was requested.
    pub fn has_output_directives(&self) -> bool {
        self.text_out.is_some()
            || self.json_out.is_some()
            || self.pb_out.is_some()
            || self.errors_out.is_some()
            || self.plugin.is_some()
    }

    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            resolve_references: self.resolve_references,
        }
    }

    /// Name the input is known by in plugin requests.
    pub fn input_name(&self) -> String {
        self.input.to_string_lossy().into_owned()
    }

    /// Dispatcher searching `PATH` with the configured timeout.
    pub fn dispatcher(&self) -> PluginDispatcher {
        PluginDispatcher::new().with_timeout(self.plugin_timeout)
    }
}
