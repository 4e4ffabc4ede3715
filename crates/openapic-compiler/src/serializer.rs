//! Writing a compiled document in each requested encoding.
//!
//! Every output is independent: one failing encoding or unwritable path is
//! reported in its own [`OutputReport`] and the rest are still produced.

use std::fmt;
use std::path::{Path, PathBuf};

use openapic_document::Document;
use prost::Message;

use crate::error::EncodingError;

/// Output encodings of a compiled document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// Human-readable YAML.
    Text,
    Json,
    /// Protobuf, the same bytes plugins receive.
    Binary,
}

impl Encoding {
    pub const ALL: [Encoding; 3] = [Encoding::Text, Encoding::Json, Encoding::Binary];

    pub fn label(self) -> &'static str {
        match self {
            Encoding::Text => "text",
            Encoding::Json => "json",
            Encoding::Binary => "binary",
        }
    }

    pub fn encode(self, document: &Document) -> Result<Vec<u8>, EncodingError> {
        Ok(match self {
            Encoding::Text => serde_yaml::to_string(document)?.into_bytes(),
            Encoding::Json => serde_json::to_vec(document)?,
            Encoding::Binary => document.encode_to_vec(),
        })
    }

    pub fn decode(self, bytes: &[u8]) -> Result<Document, EncodingError> {
        Ok(match self {
            Encoding::Text => serde_yaml::from_slice(bytes)?,
            Encoding::Json => serde_json::from_slice(bytes)?,
            Encoding::Binary => Document::decode(bytes)?,
        })
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One requested output: an encoding and where to write it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRequest {
    pub encoding: Encoding,
    pub path: PathBuf,
}

impl OutputRequest {
    pub fn new(encoding: Encoding, path: impl Into<PathBuf>) -> Self {
        Self {
            encoding,
            path: path.into(),
        }
    }
}

/// What happened to one requested output. On success holds the byte count.
#[derive(Debug)]
pub struct OutputReport {
    pub encoding: Encoding,
    pub path: PathBuf,
    pub result: Result<usize, EncodingError>,
}

impl OutputReport {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Encode `document` once per request and write each result to its path.
pub fn write_outputs(document: &Document, requests: &[OutputRequest]) -> Vec<OutputReport> {
    requests
        .iter()
        .map(|request| {
            let result = write_output(document, request.encoding, &request.path);
            match &result {
                Ok(bytes) => openapic_telemetry::log_output_written!(
                    encoding = %request.encoding,
                    path = %request.path.display(),
                    bytes,
                    "wrote output"
                ),
                Err(e) => openapic_telemetry::log_output_failed!(
                    encoding = %request.encoding,
                    path = %request.path.display(),
                    error = %e,
                    "output failed"
                ),
            }
            OutputReport {
                encoding: request.encoding,
                path: request.path.clone(),
                result,
            }
        })
        .collect()
}

fn write_output(document: &Document, encoding: Encoding, path: &Path) -> Result<usize, EncodingError> {
    let bytes = encoding.encode(document)?;
    std::fs::write(path, &bytes).map_err(|source| EncodingError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(bytes.len())
}
