use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::error::{ParseError, ResolutionError};
use crate::model::{Document, Node, NodeId, NodeValue, Source};
use crate::parser::{parse_fragment, ParseContext};

/// Resolve every `$ref` in the document in place.
///
/// `base` is the location of the document itself; relative file references
/// are looked up next to it (or next to the external file that contains them).
/// Each reference is annotated with the id of the node it designates, and
/// external files are appended to the node table and recorded in
/// [`Document::sources`]. Returns the number of references resolved.
pub fn resolve_references(document: &mut Document, base: &Path) -> Result<usize, ResolutionError> {
    let mut loaded = HashMap::new();
    // References back into the input file land on the existing root.
    if let Ok(key) = std::fs::canonicalize(base) {
        loaded.insert(key, document.root);
    }
    let mut resolver = Resolver {
        document,
        base: base.to_path_buf(),
        loaded,
        in_progress: HashSet::new(),
        resolved: 0,
    };

    let mut id: NodeId = 0;
    // The table grows as external files are loaded; keep scanning to the end.
    while (id as usize) < resolver.document.nodes.len() {
        if let Some(reference) = resolver.document.nodes[id as usize].as_reference() {
            if !reference.is_resolved() {
                resolver.resolve(id)?;
            }
        }
        id += 1;
    }

    tracing::debug!(
        references = resolver.resolved,
        sources = resolver.document.sources.len(),
        "resolved references"
    );
    Ok(resolver.resolved)
}

struct Resolver<'a> {
    document: &'a mut Document,
    base: PathBuf,
    /// Canonical external file path -> root node id.
    loaded: HashMap<PathBuf, NodeId>,
    /// References currently being resolved, to detect pure `$ref` cycles.
    in_progress: HashSet<NodeId>,
    resolved: usize,
}

impl Resolver<'_> {
    /// Resolve the reference at `id` and return its (non-reference) target.
    fn resolve(&mut self, id: NodeId) -> Result<NodeId, ResolutionError> {
        let pointer = match self.document.node(id).and_then(Node::as_reference) {
            Some(reference) => match reference.target {
                Some(target) => return Ok(target),
                None => reference.pointer.clone(),
            },
            None => return Ok(id),
        };

        if !self.in_progress.insert(id) {
            return Err(ResolutionError::Cycle { pointer });
        }

        let (location, fragment) = split_pointer(&pointer);
        let start = if location.is_empty() {
            self.root_of(id)
        } else {
            self.load(location, id, &pointer)?
        };

        let mut current = self.settle(start)?;
        if !fragment.is_empty() {
            let Some(segments) = fragment.strip_prefix('/') else {
                return Err(ResolutionError::Malformed {
                    pointer: pointer.clone(),
                });
            };
            for segment in segments.split('/') {
                let segment = unescape(segment);
                let child = self
                    .child(current, &segment)
                    .ok_or_else(|| ResolutionError::Unresolvable {
                        pointer: pointer.clone(),
                        segment: segment.clone(),
                    })?;
                current = self.settle(child)?;
            }
        }

        if let Some(Node {
            value: Some(NodeValue::Reference(reference)),
        }) = self.document.node_mut(id)
        {
            reference.target = Some(current);
            self.resolved += 1;
        }
        self.in_progress.remove(&id);
        Ok(current)
    }

    /// Resolve `id` if it is a reference, otherwise return it unchanged.
    fn settle(&mut self, id: NodeId) -> Result<NodeId, ResolutionError> {
        match self.document.node(id) {
            Some(node) if node.is_reference() => self.resolve(id),
            _ => Ok(id),
        }
    }

    fn child(&self, id: NodeId, segment: &str) -> Option<NodeId> {
        match &self.document.node(id)?.value {
            Some(NodeValue::Object(mapping)) => mapping.get(segment),
            Some(NodeValue::Array(list)) => {
                let index: usize = segment.parse().ok()?;
                list.items.get(index).copied()
            }
            _ => None,
        }
    }

    /// Root of the file that contains `id`.
    fn root_of(&self, id: NodeId) -> NodeId {
        self.document
            .source_of(id)
            .map(|s| s.root)
            .unwrap_or(self.document.root)
    }

    /// Directory relative file references from `id` are resolved against.
    fn directory_of(&self, id: NodeId) -> PathBuf {
        let file = match self.document.source_of(id) {
            Some(source) => PathBuf::from(&source.location),
            None => self.base.clone(),
        };
        file.parent().map(Path::to_path_buf).unwrap_or_default()
    }

    /// Load an external file once and return its root node.
    fn load(&mut self, location: &str, from: NodeId, pointer: &str) -> Result<NodeId, ResolutionError> {
        if location.starts_with("http://") || location.starts_with("https://") {
            return Err(ResolutionError::Unsupported {
                pointer: pointer.to_string(),
            });
        }

        let path = self.directory_of(from).join(location);
        // `a/./x.yaml` and `a/b/../x.yaml` are the same file.
        let key = std::fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
        if let Some(root) = self.loaded.get(&key) {
            return Ok(*root);
        }

        let raw = std::fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ResolutionError::FileNotFound {
                pointer: pointer.to_string(),
                path: path.clone(),
            },
            _ => ResolutionError::Io {
                pointer: pointer.to_string(),
                path: path.clone(),
                source: e,
            },
        })?;

        let start = self.document.nodes.len() as NodeId;
        let context = ParseContext::new(path.display().to_string());
        let root = parse_fragment(&raw, &context, &mut self.document.nodes).map_err(
            |source: ParseError| ResolutionError::External {
                pointer: pointer.to_string(),
                path: path.clone(),
                source,
            },
        )?;
        let end = self.document.nodes.len() as NodeId;

        tracing::debug!(path = %path.display(), nodes = end - start, "loaded external reference");
        self.document.sources.push(Source {
            location: path.display().to_string(),
            root,
            start,
            end,
        });
        self.loaded.insert(key, root);
        Ok(root)
    }
}

/// Split `file.yaml#/a/b` into `("file.yaml", "/a/b")`.
fn split_pointer(pointer: &str) -> (&str, &str) {
    match pointer.split_once('#') {
        Some((location, fragment)) => (location, fragment),
        None => (pointer, ""),
    }
}

/// JSON pointer unescaping (RFC 6901).
fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}
