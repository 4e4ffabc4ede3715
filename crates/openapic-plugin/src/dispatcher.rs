//! Running plugins as child processes.
//!
//! A plugin named `foo` is the executable `openapi_foo` somewhere on the
//! search path. The encoded [`PluginRequest`] is its entire stdin; its entire
//! stdout, read to end-of-stream, is the encoded [`PluginResponse`]. There is
//! no other framing.

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use prost::Message;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

use crate::error::PluginError;
use crate::messages::{PluginRequest, PluginResponse};

/// Prefix joining a plugin name to its executable name.
pub const PLUGIN_PREFIX: &str = "openapi_";

/// Outcome of one plugin invocation.
///
/// `response` is the best response that could be recovered; it is empty when
/// the plugin could not run or its output did not decode.
#[derive(Debug, Default)]
pub struct Dispatch {
    pub response: PluginResponse,
    pub failures: Vec<PluginError>,
}

impl Dispatch {
    fn failed(failure: PluginError) -> Self {
        Self {
            response: PluginResponse::default(),
            failures: vec![failure],
        }
    }

    /// True if the plugin ran, exited successfully and answered with a
    /// well-formed response.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Write every response text segment in order, without separators.
    pub fn write_to<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        for text in &self.response.text {
            out.write_all(text.as_bytes())?;
        }
        out.flush()
    }
}

/// Locates and runs plugin executables.
#[derive(Debug, Clone)]
pub struct PluginDispatcher {
    search_path: Vec<PathBuf>,
    timeout: Option<Duration>,
}

impl Default for PluginDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginDispatcher {
    /// Dispatcher searching the directories of the process `PATH`.
    pub fn new() -> Self {
        let search_path = std::env::var_os("PATH")
            .map(|path| std::env::split_paths(&path).collect())
            .unwrap_or_default();
        Self {
            search_path,
            timeout: None,
        }
    }

    /// Replace the directories searched for plugin executables.
    pub fn with_search_path<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.search_path = dirs.into_iter().map(Into::into).collect();
        self
    }

    /// Kill the plugin if it has not finished after `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Executable name for a plugin.
    pub fn executable_name(plugin: &str) -> String {
        format!("{PLUGIN_PREFIX}{plugin}")
    }

    /// Find the executable for `plugin` on the search path.
    pub fn locate(&self, plugin: &str) -> Result<PathBuf, PluginError> {
        let executable = Self::executable_name(plugin);
        let found = self
            .search_path
            .iter()
            .flat_map(|dir| candidates(dir, &executable))
            .find(|candidate| is_executable(candidate));
        found.ok_or_else(|| PluginError::NotFound {
            name: plugin.to_string(),
            executable,
        })
    }

    /// Run `plugin` with `request` and collect its response.
    ///
    /// Blocks until the child exits and its stdout is drained (or the timeout
    /// fires). Never retries. A non-zero exit is reported but the output is
    /// still decoded.
    pub async fn dispatch(&self, plugin: &str, request: &PluginRequest) -> Dispatch {
        let executable = match self.locate(plugin) {
            Ok(path) => path,
            Err(e) => return Dispatch::failed(e),
        };
        let io_error = |source: std::io::Error| PluginError::Io {
            name: plugin.to_string(),
            executable: executable.clone(),
            source,
        };

        tracing::debug!(plugin, executable = %executable.display(), "spawning plugin");
        let mut child = match Command::new(&executable)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => return Dispatch::failed(io_error(e)),
        };

        let input = request.encode_to_vec();
        let stdin = child.stdin.take();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                stdin.write_all(&input).await?;
                stdin.shutdown().await?;
            }
            Ok::<_, std::io::Error>(())
        };

        // Output is collected outside the exchange so whatever arrived before
        // a timeout is still available afterwards.
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut stdout_pipe = child.stdout.take();
        let mut stderr_pipe = child.stderr.take();
        // Feed stdin and drain both output pipes together so no pipe can fill
        // up while the other side waits.
        let exchange = async {
            let (fed, read_out, read_err) = tokio::join!(
                feed,
                drain(stdout_pipe.as_mut(), &mut stdout),
                drain(stderr_pipe.as_mut(), &mut stderr),
            );
            let status = match read_out.and(read_err) {
                Ok(()) => child.wait().await,
                Err(e) => Err(e),
            };
            (fed, status)
        };

        let mut failures = Vec::new();
        let (fed, status) = match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, exchange).await {
                Ok(result) => result,
                Err(_) => {
                    if let Err(e) = child.kill().await {
                        tracing::warn!(plugin, error = %e, "failed to kill plugin");
                    }
                    failures.push(PluginError::TimedOut {
                        name: plugin.to_string(),
                        timeout,
                    });
                    // A response cut off mid-message is dropped; a complete one is kept.
                    let response = PluginResponse::decode(stdout.as_slice()).unwrap_or_default();
                    return Dispatch { response, failures };
                }
            },
            None => exchange.await,
        };

        if let Err(e) = fed {
            // A plugin may legitimately exit without reading all of stdin.
            tracing::warn!(plugin, error = %e, "failed to write plugin request");
        }
        let status = match status {
            Ok(status) => status,
            Err(e) => return Dispatch::failed(io_error(e)),
        };

        if !status.success() {
            failures.push(PluginError::ExecutionFailed {
                name: plugin.to_string(),
                status,
                stderr: String::from_utf8_lossy(&stderr).into_owned(),
            });
        }

        let response = match PluginResponse::decode(stdout.as_slice()) {
            Ok(response) => response,
            Err(source) => {
                failures.push(PluginError::Protocol {
                    name: plugin.to_string(),
                    source,
                });
                PluginResponse::default()
            }
        };

        tracing::debug!(
            plugin,
            %status,
            segments = response.text.len(),
            "plugin finished"
        );
        Dispatch { response, failures }
    }
}

/// Read `pipe` to end-of-stream into `buf`. A missing pipe reads as empty.
async fn drain<R: AsyncRead + Unpin>(pipe: Option<&mut R>, buf: &mut Vec<u8>) -> std::io::Result<()> {
    if let Some(pipe) = pipe {
        pipe.read_to_end(buf).await?;
    }
    Ok(())
}

/// File names an executable may have in `dir`.
fn candidates(dir: &Path, executable: &str) -> Vec<PathBuf> {
    let mut names = vec![OsString::from(executable)];
    if cfg!(windows) {
        names.push(OsString::from(format!("{executable}.exe")));
    }
    names.into_iter().map(|name| dir.join(name)).collect()
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
