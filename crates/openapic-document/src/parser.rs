use serde_yaml::Value;

use crate::error::{Diagnostic, ParseError};
use crate::model::{Document, Entry, Mapping, Node, NodeId, NodeList, NodeValue, Reference, SpecFormat};

/// HTTP methods recognized as operations inside a path item.
const HTTP_METHODS: &[&str] = &[
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// Name under which diagnostics locate the document root.
pub const ROOT_CONTEXT: &str = "$root";

/// Names the document being parsed; diagnostic locations are rooted here.
#[derive(Debug, Clone)]
pub struct ParseContext {
    name: String,
}

impl ParseContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Context for a top-level API document.
    pub fn root() -> Self {
        Self::new(ROOT_CONTEXT)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Default for ParseContext {
    fn default() -> Self {
        Self::root()
    }
}

/// Parse a Swagger 2.0 or OpenAPI 3.x document from YAML/JSON bytes.
///
/// All structural problems are collected before failing, so a single
/// [`ParseError::Invalid`] lists every diagnostic found.
pub fn parse(raw: &[u8], context: &ParseContext) -> Result<Document, ParseError> {
    let value = load_yaml(raw)?;

    let mut document = Document::default();
    let mut builder = NodeBuilder::new(&mut document.nodes);
    let root = builder.build(&value, context.name());
    let mut diagnostics = builder.diagnostics;
    document.root = root;

    check_structure(&mut document, context, &mut diagnostics);

    if diagnostics.is_empty() {
        tracing::debug!(
            format = %document.format(),
            nodes = document.nodes.len(),
            "parsed document"
        );
        Ok(document)
    } else {
        Err(ParseError::Invalid(diagnostics))
    }
}

/// Parse a YAML/JSON file that is not itself an API description (the target
/// of an external `$ref`) into an existing node table. Returns the id of the
/// fragment's root node.
pub fn parse_fragment(
    raw: &[u8],
    context: &ParseContext,
    nodes: &mut Vec<Node>,
) -> Result<NodeId, ParseError> {
    let value = load_yaml(raw)?;
    let mut builder = NodeBuilder::new(nodes);
    let root = builder.build(&value, context.name());
    if builder.diagnostics.is_empty() {
        Ok(root)
    } else {
        Err(ParseError::Invalid(builder.diagnostics))
    }
}

fn load_yaml(raw: &[u8]) -> Result<Value, ParseError> {
    // JSON is valid YAML, one loader covers both
    let text = std::str::from_utf8(raw)?;
    serde_yaml::from_str(text).map_err(|e| {
        let (line, column) = e
            .location()
            .map(|l| (l.line(), l.column()))
            .unwrap_or((0, 0));
        ParseError::Syntax {
            message: e.to_string(),
            line,
            column,
        }
    })
}

/// Flattens a YAML tree into the node table, children before parents.
struct NodeBuilder<'a> {
    nodes: &'a mut Vec<Node>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> NodeBuilder<'a> {
    fn new(nodes: &'a mut Vec<Node>) -> Self {
        Self {
            nodes,
            diagnostics: Vec::new(),
        }
    }

    fn push(&mut self, value: Option<NodeValue>) -> NodeId {
        self.nodes.push(Node { value });
        (self.nodes.len() - 1) as NodeId
    }

    fn build(&mut self, value: &Value, location: &str) -> NodeId {
        match value {
            Value::Null => self.push(None),
            Value::Bool(b) => self.push(Some(NodeValue::Boolean(*b))),
            Value::Number(n) => {
                let value = match n.as_i64() {
                    Some(i) => NodeValue::Integer(i),
                    None => NodeValue::Float(n.as_f64().unwrap_or(f64::NAN)),
                };
                self.push(Some(value))
            }
            Value::String(s) => self.push(Some(NodeValue::String(s.clone()))),
            Value::Sequence(items) => {
                let items = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| self.build(item, &format!("{location}[{i}]")))
                    .collect();
                self.push(Some(NodeValue::Array(NodeList { items })))
            }
            Value::Mapping(mapping) => self.build_mapping(mapping, location),
            Value::Tagged(tagged) => self.build(&tagged.value, location),
        }
    }

    fn build_mapping(&mut self, mapping: &serde_yaml::Mapping, location: &str) -> NodeId {
        let mut pointer = None;
        let mut entries = Vec::with_capacity(mapping.len());

        for (key, value) in mapping {
            let Some(key) = self.key_text(key, location) else {
                continue;
            };
            if key == "$ref" {
                match value.as_str() {
                    Some(p) => {
                        pointer = Some(p.to_string());
                        continue;
                    }
                    None => self.diagnostics.push(Diagnostic::new(
                        location,
                        "$ref must be a string",
                    )),
                }
            }
            let child_location = format!("{location}.{key}");
            let node = self.build(value, &child_location);
            entries.push(Entry { key, node });
        }

        let value = match pointer {
            Some(pointer) => NodeValue::Reference(Reference {
                pointer,
                target: None,
                siblings: entries,
            }),
            None => NodeValue::Object(Mapping { entries }),
        };
        self.push(Some(value))
    }

    fn key_text(&mut self, key: &Value, location: &str) -> Option<String> {
        match key {
            Value::String(s) => Some(s.clone()),
            // Response codes are commonly written unquoted
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Tagged(tagged) => self.key_text(&tagged.value, location),
            other => {
                self.diagnostics.push(Diagnostic::new(
                    location,
                    format!("unsupported mapping key: {other:?}"),
                ));
                None
            }
        }
    }
}

/// Validate the top-level shape and fill in the document header fields.
fn check_structure(
    document: &mut Document,
    context: &ParseContext,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let root_location = context.name();
    let Some(root) = document.node(document.root).and_then(Node::as_mapping) else {
        diagnostics.push(Diagnostic::new(root_location, "document root must be a mapping"));
        return;
    };
    let root = root.clone();

    let text = |id: Option<NodeId>| {
        id.and_then(|id| document.node(id))
            .and_then(Node::as_str)
            .map(str::to_string)
    };

    let (format, spec_version) = if let Some(id) = root.get("swagger") {
        match text(Some(id)) {
            Some(v) if v == "2.0" => (SpecFormat::Swagger, v),
            Some(v) => {
                diagnostics.push(Diagnostic::new(
                    format!("{root_location}.swagger"),
                    format!("unsupported version '{v}' (only 2.0 is supported)"),
                ));
                (SpecFormat::Unspecified, v)
            }
            None => {
                diagnostics.push(Diagnostic::new(
                    format!("{root_location}.swagger"),
                    "must be a string",
                ));
                (SpecFormat::Unspecified, String::new())
            }
        }
    } else if let Some(id) = root.get("openapi") {
        match text(Some(id)) {
            Some(v) if v.starts_with("3.") => (SpecFormat::OpenApi, v),
            Some(v) => {
                diagnostics.push(Diagnostic::new(
                    format!("{root_location}.openapi"),
                    format!("unsupported version '{v}' (only 3.x is supported)"),
                ));
                (SpecFormat::Unspecified, v)
            }
            None => {
                diagnostics.push(Diagnostic::new(
                    format!("{root_location}.openapi"),
                    "must be a string",
                ));
                (SpecFormat::Unspecified, String::new())
            }
        }
    } else {
        diagnostics.push(Diagnostic::new(
            root_location,
            "missing required property 'swagger' or 'openapi'",
        ));
        (SpecFormat::Unspecified, String::new())
    };

    let info_location = format!("{root_location}.info");
    let (title, api_version) = match root.get("info").and_then(|id| document.node(id)) {
        Some(node) if node.is_reference() => (String::new(), String::new()),
        Some(node) => match node.as_mapping() {
            Some(info) => {
                let title = text(info.get("title"));
                let version = text(info.get("version"));
                if title.is_none() {
                    diagnostics.push(Diagnostic::new(
                        &info_location,
                        "missing required string property 'title'",
                    ));
                }
                if version.is_none() {
                    diagnostics.push(Diagnostic::new(
                        &info_location,
                        "missing required string property 'version'",
                    ));
                }
                (title.unwrap_or_default(), version.unwrap_or_default())
            }
            None => {
                diagnostics.push(Diagnostic::new(&info_location, "must be a mapping"));
                (String::new(), String::new())
            }
        },
        None => {
            diagnostics.push(Diagnostic::new(
                root_location,
                "missing required property 'info'",
            ));
            (String::new(), String::new())
        }
    };

    match root.get("paths") {
        Some(paths) => check_paths(document, paths, root_location, diagnostics),
        // OpenAPI 3.1 allows webhook-only documents
        None if format == SpecFormat::Swagger => diagnostics.push(Diagnostic::new(
            root_location,
            "missing required property 'paths'",
        )),
        None => {}
    }

    document.format = format as i32;
    document.spec_version = spec_version;
    document.title = title;
    document.api_version = api_version;
}

fn check_paths(
    document: &Document,
    paths: NodeId,
    root_location: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let location = format!("{root_location}.paths");
    let Some(node) = document.node(paths) else {
        return;
    };
    if node.is_reference() {
        return;
    }
    let Some(paths) = node.as_mapping() else {
        diagnostics.push(Diagnostic::new(location, "must be a mapping"));
        return;
    };

    for entry in &paths.entries {
        if entry.key.starts_with("x-") {
            continue;
        }
        let item_location = format!("{location}.{}", entry.key);
        if !entry.key.starts_with('/') {
            diagnostics.push(Diagnostic::new(
                &item_location,
                "path must start with '/'",
            ));
            continue;
        }
        let Some(item) = document.node(entry.node) else {
            continue;
        };
        if item.is_reference() {
            continue;
        }
        let Some(item) = item.as_mapping() else {
            diagnostics.push(Diagnostic::new(&item_location, "path item must be a mapping"));
            continue;
        };
        for method in HTTP_METHODS {
            let Some(op) = item.get(method).and_then(|id| document.node(id)) else {
                continue;
            };
            if op.as_mapping().is_none() && !op.is_reference() {
                diagnostics.push(Diagnostic::new(
                    format!("{item_location}.{method}"),
                    "operation must be a mapping",
                ));
            }
        }
    }
}
