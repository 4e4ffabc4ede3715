use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a node in a [`Document`] node table.
pub type NodeId = u32;

/// Document format, detected from the root `swagger` or `openapi` field.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration,
)]
#[repr(i32)]
pub enum SpecFormat {
    Unspecified = 0,
    /// OpenAPI 2.0 (`swagger: "2.0"`).
    Swagger = 1,
    /// OpenAPI 3.x (`openapi: "3.x.y"`).
    OpenApi = 2,
}

impl fmt::Display for SpecFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SpecFormat::Unspecified => "unspecified",
            SpecFormat::Swagger => "swagger",
            SpecFormat::OpenApi => "openapi",
        };
        f.write_str(name)
    }
}

/// A parsed API description.
///
/// The tree is stored as a flat table of nodes addressed by [`NodeId`].
/// Children refer to each other by id, so a `$ref` that points back at one of
/// its ancestors is just another id and needs no shared ownership.
#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
pub struct Document {
    #[prost(enumeration = "SpecFormat", tag = "1")]
    pub format: i32,
    /// Value of the root `swagger` / `openapi` field.
    #[prost(string, tag = "2")]
    pub spec_version: String,
    /// `info.title`.
    #[prost(string, tag = "3")]
    pub title: String,
    /// `info.version`.
    #[prost(string, tag = "4")]
    pub api_version: String,
    #[prost(uint32, tag = "5")]
    pub root: NodeId,
    #[prost(message, repeated, tag = "6")]
    pub nodes: Vec<Node>,
    /// External files pulled in while resolving references.
    #[prost(message, repeated, tag = "7")]
    pub sources: Vec<Source>,
}

/// One value in the node table. `None` is YAML/JSON `null`.
#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Node {
    #[prost(oneof = "NodeValue", tags = "1, 2, 3, 4, 5, 6, 7")]
    pub value: Option<NodeValue>,
}

#[derive(Clone, PartialEq, prost::Oneof, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeValue {
    #[prost(bool, tag = "1")]
    Boolean(bool),
    #[prost(int64, tag = "2")]
    Integer(i64),
    #[prost(double, tag = "3")]
    Float(#[serde(with = "float_text")] f64),
    #[prost(string, tag = "4")]
    String(String),
    #[prost(message, tag = "5")]
    Array(NodeList),
    #[prost(message, tag = "6")]
    Object(Mapping),
    #[prost(message, tag = "7")]
    Reference(Reference),
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeList {
    #[prost(uint32, repeated, tag = "1")]
    pub items: Vec<NodeId>,
}

/// Ordered key/value entries of a mapping.
#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mapping {
    #[prost(message, repeated, tag = "1")]
    pub entries: Vec<Entry>,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
pub struct Entry {
    #[prost(string, tag = "1")]
    pub key: String,
    #[prost(uint32, tag = "2")]
    pub node: NodeId,
}

/// A `$ref` pointer and, once resolved, the node it designates.
#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
pub struct Reference {
    /// The pointer exactly as written in the source.
    #[prost(string, tag = "1")]
    pub pointer: String,
    /// Resolved target. Always a non-reference node.
    #[prost(uint32, optional, tag = "2")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<NodeId>,
    /// Keys that appeared next to `$ref` in the same mapping.
    #[prost(message, repeated, tag = "3")]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub siblings: Vec<Entry>,
}

impl Reference {
    pub fn is_resolved(&self) -> bool {
        self.target.is_some()
    }
}

/// An external file loaded during resolution.
///
/// Its nodes occupy the half-open id range `start..end`.
#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
pub struct Source {
    #[prost(string, tag = "1")]
    pub location: String,
    #[prost(uint32, tag = "2")]
    pub root: NodeId,
    #[prost(uint32, tag = "3")]
    pub start: NodeId,
    #[prost(uint32, tag = "4")]
    pub end: NodeId,
}

impl Source {
    pub fn contains(&self, id: NodeId) -> bool {
        (self.start..self.end).contains(&id)
    }
}

impl Node {
    pub fn null() -> Self {
        Self { value: None }
    }

    pub fn from_value(value: NodeValue) -> Self {
        Self { value: Some(value) }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            Some(NodeValue::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match &self.value {
            Some(NodeValue::Object(m)) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&NodeList> {
        match &self.value {
            Some(NodeValue::Array(l)) => Some(l),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&Reference> {
        match &self.value {
            Some(NodeValue::Reference(r)) => Some(r),
            _ => None,
        }
    }

    pub fn is_reference(&self) -> bool {
        self.as_reference().is_some()
    }
}

impl Mapping {
    /// Look up a key, returning the child id.
    pub fn get(&self, key: &str) -> Option<NodeId> {
        self.entries.iter().find(|e| e.key == key).map(|e| e.node)
    }
}

impl Document {
    /// Append a node and return its id.
    pub fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        (self.nodes.len() - 1) as NodeId
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id as usize)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id as usize)
    }

    /// Child of a mapping node by key. References are followed first.
    pub fn get(&self, id: NodeId, key: &str) -> Option<NodeId> {
        self.node(self.deref(id))?.as_mapping()?.get(key)
    }

    /// Follow a path of mapping keys from `id`, dereferencing along the way.
    pub fn lookup(&self, id: NodeId, path: &[&str]) -> Option<NodeId> {
        path.iter()
            .try_fold(id, |current, key| self.get(current, key))
            .map(|found| self.deref(found))
    }

    /// Follow resolved references until a non-reference node is reached.
    ///
    /// Unresolved references are returned as-is. Stops after visiting every
    /// node once so a malformed table cannot loop.
    pub fn deref(&self, id: NodeId) -> NodeId {
        let mut current = id;
        for _ in 0..=self.nodes.len() {
            match self.node(current).and_then(Node::as_reference) {
                Some(Reference {
                    target: Some(target),
                    ..
                }) => current = *target,
                _ => break,
            }
        }
        current
    }

    /// Every reference node in the table with its id.
    pub fn references(&self) -> impl Iterator<Item = (NodeId, &Reference)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(id, node)| node.as_reference().map(|r| (id as NodeId, r)))
    }

    /// Pointers of all references that have no target.
    pub fn unresolved_references(&self) -> Vec<&str> {
        self.references()
            .filter(|(_, r)| !r.is_resolved())
            .map(|(_, r)| r.pointer.as_str())
            .collect()
    }

    /// The external source a node was loaded from, if any.
    pub fn source_of(&self, id: NodeId) -> Option<&Source> {
        self.sources.iter().find(|s| s.contains(id))
    }
}

/// Serde form of float nodes. Non-finite values, which JSON cannot hold, are
/// written as the YAML spellings `.inf`, `-.inf` and `.nan`.
mod float_text {
    use std::fmt;

    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else if value.is_nan() {
            serializer.serialize_str(".nan")
        } else if value.is_sign_positive() {
            serializer.serialize_str(".inf")
        } else {
            serializer.serialize_str("-.inf")
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        deserializer.deserialize_any(FloatVisitor)
    }

    struct FloatVisitor;

    impl Visitor<'_> for FloatVisitor {
        type Value = f64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a number or one of .inf, -.inf, .nan")
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
            match v {
                ".inf" => Ok(f64::INFINITY),
                "-.inf" => Ok(f64::NEG_INFINITY),
                ".nan" => Ok(f64::NAN),
                other => Err(E::invalid_value(de::Unexpected::Str(other), &self)),
            }
        }
    }
}
