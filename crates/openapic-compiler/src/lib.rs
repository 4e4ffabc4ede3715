//! Compiles OpenAPI/Swagger documents.
//!
//! Reads and parses one input, resolves its references, writes the result in
//! any of the text, JSON and binary encodings, and hands it to at most one
//! plugin.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod run;
pub mod serializer;

pub use config::CompilerConfig;
pub use error::{CompileError, EncodingError};
pub use pipeline::{compile, CompileOptions};
pub use run::{run, RunReport};
pub use serializer::{write_outputs, Encoding, OutputReport, OutputRequest};
