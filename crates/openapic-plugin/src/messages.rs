//! Wire messages exchanged with plugins over stdin/stdout.
//!
//! Encoded as protobuf; field numbers are part of the protocol and must not
//! change.

use std::fmt;

/// Compiler version reported to plugins.
#[derive(Clone, Copy, PartialEq, Eq, prost::Message)]
pub struct Version {
    #[prost(int32, tag = "1")]
    pub major: i32,
    #[prost(int32, tag = "2")]
    pub minor: i32,
    #[prost(int32, tag = "3")]
    pub patch: i32,
}

impl Version {
    pub fn new(major: i32, minor: i32, patch: i32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Version of this build.
    pub fn current() -> Self {
        Self::new(
            env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap_or_default(),
            env!("CARGO_PKG_VERSION_MINOR").parse().unwrap_or_default(),
            env!("CARGO_PKG_VERSION_PATCH").parse().unwrap_or_default(),
        )
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// A named, versioned payload.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Wrapper {
    /// Identifies the payload, usually the input file name.
    #[prost(string, tag = "1")]
    pub name: String,
    /// Schema version of `value`.
    #[prost(string, tag = "2")]
    pub version: String,
    #[prost(bytes = "vec", tag = "3")]
    pub value: Vec<u8>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct PluginRequest {
    #[prost(string, tag = "1")]
    pub parameter: String,
    #[prost(message, optional, tag = "2")]
    pub compiler_version: Option<Version>,
    #[prost(message, repeated, tag = "3")]
    pub wrapper: Vec<Wrapper>,
}

/// Text produced by a plugin, written to the compiler's stdout in order.
#[derive(Clone, PartialEq, prost::Message)]
pub struct PluginResponse {
    #[prost(string, repeated, tag = "1")]
    pub text: Vec<String>,
}
