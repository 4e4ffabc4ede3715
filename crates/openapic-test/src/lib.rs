//! Test harnesses for openapic.
//!
//! Provides the shared fixture documents, a scratch [`TestWorkspace`] for
//! compiler runs, and the `openapi_echo` fixture plugin (built as a binary
//! of this crate).

use std::path::{Path, PathBuf};

use openapic_compiler::{CompilerConfig, Encoding};
use openapic_document::Document;
use tempfile::TempDir;

/// Absolute path to the shared test fixtures directory.
pub fn fixtures() -> PathBuf {
    // CARGO_MANIFEST_DIR = .../crates/openapic-test
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../..")
        .join("tests/fixtures")
}

/// Absolute path of one fixture file.
pub fn fixture(name: &str) -> PathBuf {
    fixtures().join(name)
}

/// A temporary directory holding the outputs of one compiler run.
pub struct TestWorkspace {
    dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            dir: TempDir::new()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Where the output for `encoding` is written.
    pub fn output(&self, encoding: Encoding) -> PathBuf {
        let file = match encoding {
            Encoding::Text => "out.yaml",
            Encoding::Json => "out.json",
            Encoding::Binary => "out.pb",
        };
        self.dir.path().join(file)
    }

    pub fn errors(&self) -> PathBuf {
        self.dir.path().join("errors.txt")
    }

    /// Config for `input` requesting every encoding and an errors file.
    pub fn config(&self, input: impl Into<PathBuf>) -> CompilerConfig {
        CompilerConfig {
            text_out: Some(self.output(Encoding::Text)),
            json_out: Some(self.output(Encoding::Json)),
            pb_out: Some(self.output(Encoding::Binary)),
            errors_out: Some(self.errors()),
            ..CompilerConfig::new(input)
        }
    }

    /// Decode the output previously written for `encoding`.
    pub fn read_output(&self, encoding: Encoding) -> Option<Document> {
        let bytes = std::fs::read(self.output(encoding)).ok()?;
        encoding.decode(&bytes).ok()
    }

    /// Names of the files in the workspace, sorted.
    pub fn files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.dir.path())
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .map(|entry| entry.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }
}
