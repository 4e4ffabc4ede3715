use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors: any of these stops the pipeline before output is produced.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The input file could not be read.
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input is not a well-formed API description.
    #[error(transparent)]
    Parse(#[from] openapic_document::ParseError),

    /// A `$ref` could not be resolved.
    #[error(transparent)]
    Resolution(#[from] openapic_document::ResolutionError),
}

/// A single output encoding failed. Other outputs are unaffected.
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("text encoding failed: {0}")]
    Text(#[from] serde_yaml::Error),

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("binary decoding failed: {0}")]
    Binary(#[from] prost::DecodeError),

    #[error("cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
