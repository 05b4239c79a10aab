//! Message tree data model

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use super::DotPath;

/// Children of a [`MessageTree::Node`], in file order.
pub type MessageMap = IndexMap<String, MessageTree>;

/// One locale's catalog: nested string mappings ending in translatable leaves.
///
/// Equality ignores key order; serialization keeps it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MessageTree {
    /// Translatable text.
    Leaf(String),
    /// Nested keys.
    Node(MessageMap),
}

/// A JSON value that has no place in a message catalog.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported {kind} value at '{path}'")]
pub struct ShapeError {
    /// Where the value was found.
    pub path: DotPath,
    /// JSON type name of the value.
    pub kind: &'static str,
}

impl Default for MessageTree {
    fn default() -> Self {
        Self::empty()
    }
}

impl MessageTree {
    /// An empty root node.
    #[must_use]
    pub fn empty() -> Self {
        Self::Node(MessageMap::new())
    }

    /// Text of a leaf.
    #[must_use]
    pub fn as_leaf(&self) -> Option<&str> {
        match self {
            Self::Leaf(text) => Some(text.as_str()),
            Self::Node(_) => None,
        }
    }

    /// Children of a node.
    #[must_use]
    pub const fn as_node(&self) -> Option<&MessageMap> {
        match self {
            Self::Node(children) => Some(children),
            Self::Leaf(_) => None,
        }
    }

    /// Number of top-level keys (0 for a leaf).
    #[must_use]
    pub fn top_level_len(&self) -> usize {
        self.as_node().map_or(0, IndexMap::len)
    }

    /// Builds a tree from a parsed JSON document.
    ///
    /// The root must be an object, every nested value an object or a string.
    /// Arrays, numbers, booleans and `null` are rejected with the path where they occur.
    pub fn from_json(value: &Value) -> Result<Self, ShapeError> {
        match value {
            Value::Object(_) => Self::from_json_at(value, &DotPath::default()),
            other => Err(ShapeError { path: DotPath::default(), kind: json_kind(other) }),
        }
    }

    /// Converts `value` found at `path`.
    fn from_json_at(value: &Value, path: &DotPath) -> Result<Self, ShapeError> {
        match value {
            Value::String(text) => Ok(Self::Leaf(text.clone())),
            Value::Object(map) => {
                let mut children = MessageMap::with_capacity(map.len());
                for (key, child) in map {
                    children.insert(key.clone(), Self::from_json_at(child, &path.child(key))?);
                }
                Ok(Self::Node(children))
            }
            other => Err(ShapeError { path: path.clone(), kind: json_kind(other) }),
        }
    }
}

/// JSON type name used in error messages.
const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
