//! Packaging compiled documents into plugin requests.

use openapic_document::Document;
use prost::Message;

use crate::error::PluginError;
use crate::messages::{PluginRequest, Version, Wrapper};

/// Schema version tag of a binary-encoded [`Document`] payload.
pub const DOCUMENT_WRAPPER_VERSION: &str = "v2";

/// Build the request sent to a plugin for one compiled document.
///
/// The request carries a single wrapper named after the input, holding the
/// protobuf-encoded document, an empty parameter and the compiler version.
pub fn build_request(document: &Document, input_name: &str) -> PluginRequest {
    PluginRequest {
        parameter: String::new(),
        compiler_version: Some(Version::current()),
        wrapper: vec![Wrapper {
            name: input_name.to_string(),
            version: DOCUMENT_WRAPPER_VERSION.to_string(),
            value: document.encode_to_vec(),
        }],
    }
}

impl PluginRequest {
    /// Decode every wrapped document, paired with its wrapper name.
    pub fn documents(&self) -> Result<Vec<(&str, Document)>, PluginError> {
        self.wrapper
            .iter()
            .map(|wrapper| {
                if wrapper.version != DOCUMENT_WRAPPER_VERSION {
                    return Err(PluginError::UnsupportedWrapper {
                        name: wrapper.name.clone(),
                        version: wrapper.version.clone(),
                    });
                }
                let document = Document::decode(wrapper.value.as_slice()).map_err(|source| {
                    PluginError::InvalidWrapper {
                        name: wrapper.name.clone(),
                        source,
                    }
                })?;
                Ok((wrapper.name.as_str(), document))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openapic_document::{parse, ParseContext};

    fn petstore() -> Document {
        parse(
            br#"
swagger: "2.0"
info: {title: Petstore, version: "1.0.0"}
paths:
  /pets:
    get:
      responses:
        "200": {description: ok}
"#,
            &ParseContext::root(),
        )
        .unwrap()
    }

    #[test]
    fn request_has_single_v2_wrapper() {
        let document = petstore();
        let request = build_request(&document, "petstore.yaml");

        assert_eq!(request.parameter, "");
        assert_eq!(request.compiler_version, Some(Version::current()));
        assert_eq!(request.wrapper.len(), 1);
        assert_eq!(request.wrapper[0].name, "petstore.yaml");
        assert_eq!(request.wrapper[0].version, "v2");
        assert_eq!(request.wrapper[0].value, document.encode_to_vec());
    }

    #[test]
    fn documents_round_trip_through_request() {
        let document = petstore();
        let request = build_request(&document, "petstore.yaml");

        let documents = request.documents().unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].0, "petstore.yaml");
        assert_eq!(documents[0].1, document);
    }

    #[test]
    fn documents_rejects_unknown_wrapper_version() {
        let mut request = build_request(&petstore(), "petstore.yaml");
        request.wrapper[0].version = "v3".into();

        assert!(matches!(
            request.documents(),
            Err(PluginError::UnsupportedWrapper { version, .. }) if version == "v3"
        ));
    }

    #[test]
    fn documents_rejects_garbage_payload() {
        let mut request = build_request(&petstore(), "petstore.yaml");
        request.wrapper[0].value = vec![0xff, 0xff, 0xff];

        assert!(matches!(
            request.documents(),
            Err(PluginError::InvalidWrapper { .. })
        ));
    }
}
