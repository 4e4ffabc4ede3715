//! One full compiler run: compile, write outputs, run the plugin.

use std::io::Write;

use openapic_document::Document;
use openapic_plugin::{build_request, Dispatch, PluginDispatcher};

use crate::config::CompilerConfig;
use crate::error::CompileError;
use crate::pipeline::compile;
use crate::serializer::{write_outputs, OutputReport};

/// What a run produced once compilation succeeded.
#[derive(Debug, Default)]
pub struct RunReport {
    /// One report per requested output.
    pub outputs: Vec<OutputReport>,
    /// Set when a plugin was requested.
    pub plugin: Option<Dispatch>,
    /// Writing the plugin's text to stdout failed.
    pub stdout_error: Option<std::io::Error>,
}

impl RunReport {
    /// Human-readable form of every non-fatal failure, one line per entry.
    pub fn failure_messages(&self) -> Vec<String> {
        let outputs = self.outputs.iter().filter_map(|report| {
            report
                .result
                .as_ref()
                .err()
                .map(|e| format!("{} output failed: {e}", report.encoding))
        });
        let plugin = self
            .plugin
            .iter()
            .flat_map(|dispatch| dispatch.failures.iter().map(ToString::to_string));
        let stdout = self
            .stdout_error
            .iter()
            .map(|e| format!("cannot write plugin output: {e}"));

        outputs
            .chain(plugin)
            .chain(stdout)
            .map(|message| single_line(&message))
            .collect()
    }

    pub fn is_clean(&self) -> bool {
        self.failure_messages().is_empty()
    }
}

/// Compile `config.input`, write every requested output, then run the
/// requested plugin and copy its text to `stdout`.
///
/// A compile failure is returned as the error, after being persisted to
/// `errors_out`. Anything failing after that lands in the report and, when
/// `errors_out` is set, in that file.
pub async fn run<W: Write>(
    config: &CompilerConfig,
    dispatcher: &PluginDispatcher,
    stdout: &mut W,
) -> Result<RunReport, CompileError> {
    let document = match compile(&config.input, &config.compile_options()) {
        Ok(document) => document,
        Err(e) => {
            persist_errors(config, &e.to_string());
            return Err(e);
        }
    };

    let mut report = RunReport {
        outputs: write_outputs(&document, &config.outputs()),
        ..RunReport::default()
    };

    if let Some(plugin) = &config.plugin {
        let dispatch = run_plugin(dispatcher, plugin, &document, &config.input_name()).await;
        if let Err(e) = dispatch.write_to(stdout) {
            report.stdout_error = Some(e);
        }
        report.plugin = Some(dispatch);
    }

    let failures = report.failure_messages();
    if !failures.is_empty() {
        let mut text = failures.join("\n");
        text.push('\n');
        persist_errors(config, &text);
    }

    Ok(report)
}

async fn run_plugin(
    dispatcher: &PluginDispatcher,
    plugin: &str,
    document: &Document,
    input_name: &str,
) -> Dispatch {
    openapic_telemetry::log_plugin_invoked!(
        plugin,
        executable = %PluginDispatcher::executable_name(plugin),
        "running plugin"
    );

    let request = build_request(document, input_name);
    let dispatch = dispatcher.dispatch(plugin, &request).await;

    for failure in &dispatch.failures {
        openapic_telemetry::log_plugin_failed!(plugin, error = %failure, "plugin failed");
    }
    dispatch
}

/// Join the non-empty lines of `message` with ` | `.
fn single_line(message: &str) -> String {
    message
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" | ")
}

fn persist_errors(config: &CompilerConfig, text: &str) {
    let Some(path) = &config.errors_out else {
        return;
    };
    if let Err(e) = std::fs::write(path, text) {
        tracing::warn!(path = %path.display(), error = %e, "cannot write errors file");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serializer::Encoding;
    use openapic_plugin::PluginError;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const SPEC: &str = r##"
openapi: "3.0.3"
info: {title: Pets, version: "1.0"}
paths:
  /pets:
    get:
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema: {$ref: "#/components/schemas/Pet"}
components:
  schemas:
    Pet:
      type: object
      properties:
        name: {type: string}
"##;

    fn write_spec(temp: &TempDir) -> PathBuf {
        let input = temp.path().join("pets.yaml");
        std::fs::write(&input, SPEC).unwrap();
        input
    }

    fn no_plugins() -> PluginDispatcher {
        PluginDispatcher::new().with_search_path(Vec::<PathBuf>::new())
    }

    #[tokio::test]
    async fn missing_input_writes_errors_and_nothing_else() {
        let temp = TempDir::new().unwrap();
        let errors = temp.path().join("errors.txt");
        let config = CompilerConfig {
            json_out: Some(temp.path().join("out.json")),
            pb_out: Some(temp.path().join("out.pb")),
            errors_out: Some(errors.clone()),
            ..CompilerConfig::new(temp.path().join("absent.yaml"))
        };
        let mut stdout = Vec::new();

        let err = run(&config, &no_plugins(), &mut stdout).await.unwrap_err();

        assert!(matches!(err, CompileError::Read { .. }));
        assert_eq!(std::fs::read_to_string(&errors).unwrap(), err.to_string());
        assert!(!temp.path().join("out.json").exists());
        assert!(!temp.path().join("out.pb").exists());
        assert!(stdout.is_empty());
    }

    #[tokio::test]
    async fn all_outputs_decode_to_the_compiled_document() {
        let temp = TempDir::new().unwrap();
        let input = write_spec(&temp);
        let config = CompilerConfig {
            text_out: Some(temp.path().join("out.yaml")),
            json_out: Some(temp.path().join("out.json")),
            pb_out: Some(temp.path().join("out.pb")),
            ..CompilerConfig::new(&input)
        };

        let report = run(&config, &no_plugins(), &mut Vec::new()).await.unwrap();

        assert!(report.is_clean());
        assert!(report.plugin.is_none());
        let expected = compile(&input, &config.compile_options()).unwrap();
        for output in &config.outputs() {
            let bytes = std::fs::read(&output.path).unwrap();
            assert_eq!(output.encoding.decode(&bytes).unwrap(), expected);
        }
    }

    #[tokio::test]
    async fn clean_run_does_not_create_errors_file() {
        let temp = TempDir::new().unwrap();
        let errors = temp.path().join("errors.txt");
        let config = CompilerConfig {
            errors_out: Some(errors.clone()),
            ..CompilerConfig::new(write_spec(&temp))
        };

        let report = run(&config, &no_plugins(), &mut Vec::new()).await.unwrap();

        assert!(report.is_clean());
        assert!(report.outputs.is_empty());
        assert!(!errors.exists());
    }

    #[tokio::test]
    async fn unknown_plugin_is_reported_not_fatal() {
        let temp = TempDir::new().unwrap();
        let errors = temp.path().join("errors.txt");
        let config = CompilerConfig {
            json_out: Some(temp.path().join("out.json")),
            errors_out: Some(errors.clone()),
            plugin: Some("nonexistent".into()),
            ..CompilerConfig::new(write_spec(&temp))
        };
        let mut stdout = Vec::new();

        let report = run(&config, &no_plugins(), &mut stdout).await.unwrap();

        let dispatch = report.plugin.as_ref().unwrap();
        assert!(matches!(dispatch.failures[0], PluginError::NotFound { .. }));
        assert!(report.outputs[0].is_ok());
        assert!(stdout.is_empty());
        let persisted = std::fs::read_to_string(&errors).unwrap();
        assert!(persisted.contains("openapi_nonexistent"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn multi_line_plugin_stderr_stays_on_one_line() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let plugins = temp.path().join("bin");
        std::fs::create_dir(&plugins).unwrap();
        let script = plugins.join("openapi_noisy");
        std::fs::write(
            &script,
            "#!/bin/sh\ncat > /dev/null\necho 'first problem' >&2\necho 'second problem' >&2\nexit 3\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let errors = temp.path().join("errors.txt");
        let config = CompilerConfig {
            errors_out: Some(errors.clone()),
            plugin: Some("noisy".into()),
            ..CompilerConfig::new(write_spec(&temp))
        };
        let dispatcher = PluginDispatcher::new().with_search_path([plugins]);

        let report = run(&config, &dispatcher, &mut Vec::new()).await.unwrap();

        let failures = report.failure_messages();
        assert!(failures
            .iter()
            .any(|m| m.contains("first problem | second problem")));
        let persisted = std::fs::read_to_string(&errors).unwrap();
        assert_eq!(persisted.lines().count(), failures.len());
    }

    #[tokio::test]
    async fn output_failures_are_persisted_one_per_line() {
        let temp = TempDir::new().unwrap();
        let errors = temp.path().join("errors.txt");
        let config = CompilerConfig {
            text_out: Some(temp.path().join("missing/out.yaml")),
            json_out: Some(temp.path().join("missing/out.json")),
            pb_out: Some(temp.path().join("out.pb")),
            errors_out: Some(errors.clone()),
            ..CompilerConfig::new(write_spec(&temp))
        };

        let report = run(&config, &no_plugins(), &mut Vec::new()).await.unwrap();

        let failed: Vec<_> = report
            .outputs
            .iter()
            .filter(|o| !o.is_ok())
            .map(|o| o.encoding)
            .collect();
        assert_eq!(failed, vec![Encoding::Text, Encoding::Json]);
        let persisted = std::fs::read_to_string(&errors).unwrap();
        assert_eq!(persisted.lines().count(), 2);
        assert!(temp.path().join("out.pb").exists());
    }
}
