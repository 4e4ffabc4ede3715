//! Read, parse and resolve one input document.

use std::path::Path;

use openapic_document::{parse, resolve_references, Document, ParseContext};

use crate::error::CompileError;

/// Options controlling compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    /// Resolve `$ref` nodes against the input path (default: true).
    pub resolve_references: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            resolve_references: true,
        }
    }
}

/// Compile the document at `input`.
///
/// Fails on the first stage that fails; no partial document is returned.
pub fn compile(input: &Path, options: &CompileOptions) -> Result<Document, CompileError> {
    openapic_telemetry::log_compile_started!(
        input = %input.display(),
        resolve_references = options.resolve_references,
        "compiling"
    );

    let raw = std::fs::read(input).map_err(|source| CompileError::Read {
        path: input.to_path_buf(),
        source,
    })?;

    let mut document = parse(&raw, &ParseContext::root())?;
    openapic_telemetry::log_document_parsed!(
        format = %document.format(),
        spec_version = %document.spec_version,
        nodes = document.nodes.len(),
        "parsed"
    );

    if options.resolve_references {
        let resolved = resolve_references(&mut document, input)?;
        openapic_telemetry::log_references_resolved!(
            references = resolved,
            sources = document.sources.len(),
            "resolved"
        );
    }

    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use openapic_document::{ParseError, ResolutionError};
    use tempfile::TempDir;

    const SPEC: &str = r##"
swagger: "2.0"
info: {title: Store, version: "2"}
paths:
  /orders:
    get:
      responses:
        "200":
          description: ok
          schema: {$ref: "#/definitions/Order"}
definitions:
  Order:
    type: object
    properties:
      item: {$ref: "./shared.yaml#/Item"}
"##;

    const SHARED: &str = r#"
Item:
  type: string
"#;

    fn workspace() -> (TempDir, std::path::PathBuf) {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("store.yaml");
        std::fs::write(&input, SPEC).unwrap();
        std::fs::write(temp.path().join("shared.yaml"), SHARED).unwrap();
        (temp, input)
    }

    #[test]
    fn compile_resolves_local_and_external_references() {
        let (_temp, input) = workspace();

        let document = compile(&input, &CompileOptions::default()).unwrap();

        assert!(document.unresolved_references().is_empty());
        assert_eq!(document.references().count(), 2);
        assert_eq!(document.sources.len(), 1);
        assert_eq!(document.title, "Store");
    }

    #[test]
    fn keep_refs_leaves_references_untouched() {
        let (_temp, input) = workspace();
        let options = CompileOptions {
            resolve_references: false,
        };

        let document = compile(&input, &options).unwrap();

        let mut pointers = document.unresolved_references();
        pointers.sort();
        assert_eq!(pointers, vec!["#/definitions/Order", "./shared.yaml#/Item"]);
        assert!(document.sources.is_empty());
    }

    #[test]
    fn missing_input_is_a_read_error() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("absent.yaml");

        let err = compile(&input, &CompileOptions::default()).unwrap_err();

        assert!(matches!(err, CompileError::Read { ref path, .. } if path == &input));
    }

    #[test]
    fn invalid_document_is_a_parse_error() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("bad.yaml");
        std::fs::write(&input, "openapi: \"3.0.0\"\npaths: {}\n").unwrap();

        let err = compile(&input, &CompileOptions::default()).unwrap_err();

        match err {
            CompileError::Parse(ParseError::Invalid(diagnostics)) => {
                assert!(!diagnostics.is_empty())
            }
            other => panic!("expected parse diagnostics, got {other:?}"),
        }
    }

    #[test]
    fn dangling_reference_is_a_resolution_error() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("dangling.yaml");
        std::fs::write(
            &input,
            "openapi: \"3.0.0\"\ninfo: {title: T, version: \"1\"}\npaths: {}\nx-thing: {$ref: \"#/components/schemas/Nope\"}\n",
        )
        .unwrap();

        let err = compile(&input, &CompileOptions::default()).unwrap_err();

        assert!(matches!(
            err,
            CompileError::Resolution(ResolutionError::Unresolvable { .. })
        ));
    }
}
