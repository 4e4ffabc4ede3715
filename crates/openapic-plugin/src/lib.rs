//! Plugin protocol for openapic.
//!
//! Plugins are separate executables named `openapi_<name>`. The compiler
//! writes a protobuf [`PluginRequest`] carrying the compiled document to the
//! plugin's stdin and reads a protobuf [`PluginResponse`] from its stdout.

pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod messages;
pub mod sdk;

pub use dispatcher::{Dispatch, PluginDispatcher, PLUGIN_PREFIX};
pub use envelope::{build_request, DOCUMENT_WRAPPER_VERSION};
pub use error::PluginError;
pub use messages::{PluginRequest, PluginResponse, Version, Wrapper};
