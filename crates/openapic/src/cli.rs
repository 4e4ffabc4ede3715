//! Command-line arguments.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use openapic_compiler::CompilerConfig;
use openapic_telemetry::{LogFormat, TelemetryConfig};

#[derive(Parser, Debug)]
#[command(
    name = "openapic",
    about = "Compile OpenAPI/Swagger documents and run code-generation plugins",
    version
)]
pub struct Cli {
    /// Input document (YAML or JSON).
    pub input: Option<PathBuf>,

    /// Write the compiled document as YAML text.
    #[arg(long = "text_out", value_name = "PATH")]
    pub text_out: Option<PathBuf>,

    /// Write the compiled document as JSON.
    #[arg(long = "json_out", value_name = "PATH")]
    pub json_out: Option<PathBuf>,

    /// Write the compiled document as protobuf.
    #[arg(long = "pb_out", value_name = "PATH")]
    pub pb_out: Option<PathBuf>,

    /// Write diagnostics here when anything fails.
    #[arg(long = "errors_out", value_name = "PATH")]
    pub errors_out: Option<PathBuf>,

    /// Leave `$ref` nodes unresolved.
    #[arg(long = "keep_refs")]
    pub keep_refs: bool,

    /// Run the plugin executable `openapi_<NAME>` on the compiled document.
    #[arg(long, value_name = "NAME")]
    pub plugin: Option<String>,

    /// Kill the plugin if it runs longer than this many seconds.
    #[arg(long = "plugin_timeout", value_name = "SECS")]
    pub plugin_timeout: Option<u64>,

    /// Log filter (overridden by RUST_LOG).
    #[arg(
        long = "log_level",
        env = "OPENAPIC_LOG_LEVEL",
        default_value = "warn"
    )]
    pub log_level: String,

    /// Log format (json or pretty).
    #[arg(
        long = "log_format",
        env = "OPENAPIC_LOG_FORMAT",
        default_value = "pretty"
    )]
    pub log_format: LogFormat,
}

impl Cli {
    /// Compiler configuration, or `None` when no input was given.
    pub fn compiler_config(&self) -> Option<CompilerConfig> {
        let input = self.input.clone()?;
        Some(CompilerConfig {
            text_out: self.text_out.clone(),
            json_out: self.json_out.clone(),
            pb_out: self.pb_out.clone(),
            errors_out: self.errors_out.clone(),
            resolve_references: !self.keep_refs,
            plugin: self.plugin.clone(),
            plugin_timeout: self.plugin_timeout.map(Duration::from_secs),
            ..CompilerConfig::new(input)
        })
    }

    pub fn telemetry_config(&self) -> TelemetryConfig {
        TelemetryConfig::new()
            .with_log_level(&self.log_level)
            .with_log_format(self.log_format)
    }
}
