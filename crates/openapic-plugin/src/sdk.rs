//! Helpers for writing plugins in Rust.
//!
//! A plugin reads one [`PluginRequest`] from stdin and writes one
//! [`PluginResponse`] to stdout:
//!
//! ```no_run
//! use openapic_plugin::sdk::{read_request, write_response};
//! use openapic_plugin::PluginResponse;
//!
//! let request = read_request(std::io::stdin().lock()).unwrap();
//! let text = request.wrapper.iter().map(|w| w.name.clone()).collect();
//! write_response(std::io::stdout().lock(), &PluginResponse { text }).unwrap();
//! ```

use std::io::{Read, Write};

use prost::Message;

use crate::messages::{PluginRequest, PluginResponse};

/// Errors on the plugin side of the protocol.
#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid request: {0}")]
    Decode(#[from] prost::DecodeError),
}

/// Read a request from `reader` until end-of-stream.
pub fn read_request<R: Read>(mut reader: R) -> Result<PluginRequest, SdkError> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(PluginRequest::decode(buf.as_slice())?)
}

/// Encode `response` to `writer` and flush it.
pub fn write_response<W: Write>(mut writer: W, response: &PluginResponse) -> Result<(), SdkError> {
    writer.write_all(&response.encode_to_vec())?;
    writer.flush()?;
    Ok(())
}
