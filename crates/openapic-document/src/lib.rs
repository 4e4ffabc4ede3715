//! Swagger 2.0 / OpenAPI 3.x document model for openapic.
//!
//! Reads YAML/JSON into a flat, index-addressed node table ([`Document`]),
//! checks its structural well-formedness, and resolves `$ref` pointers in
//! place, including references into other files.

pub mod error;
pub mod model;
pub mod parser;
pub mod resolver;

pub use error::{Diagnostic, ParseError, ResolutionError};
pub use model::{
    Document, Entry, Mapping, Node, NodeId, NodeList, NodeValue, Reference, Source, SpecFormat,
};
pub use parser::{parse, parse_fragment, ParseContext, ROOT_CONTEXT};
pub use resolver::resolve_references;
