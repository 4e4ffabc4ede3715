use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// A structural problem found while parsing, with the location it was found at
/// (e.g. `$root.paths./pets.get`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub location: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.location, self.message)
    }
}

/// Errors produced while turning raw bytes into a [`Document`](crate::Document).
#[derive(Debug, Error)]
pub enum ParseError {
    /// Input is not UTF-8.
    #[error("input is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    /// YAML/JSON syntax error.
    #[error("syntax error at line {line}, column {column}: {message}")]
    Syntax {
        message: String,
        line: usize,
        column: usize,
    },

    /// The document parsed but is not a well-formed API description.
    #[error("{}", join_diagnostics(.0))]
    Invalid(Vec<Diagnostic>),
}

impl ParseError {
    /// Structural diagnostics, empty for encoding and syntax errors.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            ParseError::Invalid(diagnostics) => diagnostics,
            _ => &[],
        }
    }
}

fn join_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(Diagnostic::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Errors produced while resolving `$ref` pointers.
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// The fragment part is neither empty nor a JSON pointer.
    #[error("malformed $ref '{pointer}': fragment must be empty or start with '/'")]
    Malformed { pointer: String },

    /// A pointer segment does not exist in the target document.
    #[error("unresolved $ref '{pointer}': no '{segment}' in target")]
    Unresolvable { pointer: String, segment: String },

    /// The referenced file does not exist.
    #[error("unresolved $ref '{pointer}': file not found: {}", .path.display())]
    FileNotFound { pointer: String, path: PathBuf },

    /// The referenced file could not be read.
    #[error("unresolved $ref '{pointer}': cannot read {}: {source}", .path.display())]
    Io {
        pointer: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The referenced file is not valid YAML/JSON.
    #[error("unresolved $ref '{pointer}': {}: {source}", .path.display())]
    External {
        pointer: String,
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    /// Remote locations are not fetched.
    #[error("unsupported $ref location '{pointer}': remote references are not fetched")]
    Unsupported { pointer: String },

    /// A chain of references never reaches a concrete node.
    #[error("circular $ref '{pointer}'")]
    Cycle { pointer: String },
}

impl ResolutionError {
    /// The pointer that failed to resolve.
    pub fn pointer(&self) -> &str {
        match self {
            ResolutionError::Malformed { pointer }
            | ResolutionError::Unresolvable { pointer, .. }
            | ResolutionError::FileNotFound { pointer, .. }
            | ResolutionError::Io { pointer, .. }
            | ResolutionError::External { pointer, .. }
            | ResolutionError::Unsupported { pointer }
            | ResolutionError::Cycle { pointer } => pointer,
        }
    }
}
