//! Nested site configuration
//!
//! A Name/Value database is flattened key/value pairs such as
//! `seo.titleSuffix = " | Blog"`. `ConfigTree` turns those into a nested tree
//! with an explicit recursive insertion instead of poking at dynamic objects.
//!
//! # Value decoding
//!
//! Cells are strings. Whether a cell is JSON-decoded is a policy
//! (`ValueDecoding`); decoding is a convenience, not a contract. When it is
//! attempted and fails the raw string is kept verbatim, and any JSON value
//! that parses is accepted.

use crate::error::ContentError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Separator between path segments in a config key
pub const CONFIG_KEY_DELIMITER: char = '.';

/// A node of the configuration tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigNode {
    /// Nested mapping; listed first so JSON objects decode as branches
    Branch(ConfigTree),
    /// Leaf value (a string, or whatever JSON decoding produced)
    Leaf(Value),
}

impl ConfigNode {
    pub fn as_tree(&self) -> Option<&ConfigTree> {
        match self {
            Self::Branch(tree) => Some(tree),
            Self::Leaf(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Leaf(value) => Some(value),
            Self::Branch(_) => None,
        }
    }

    /// Wrap a value, turning JSON objects into branches
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::Branch(ConfigTree {
                entries: map
                    .into_iter()
                    .map(|(key, value)| (key, Self::from_value(value)))
                    .collect(),
            }),
            other => Self::Leaf(other),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Self::Branch(tree) => tree.to_json(),
            Self::Leaf(value) => value.clone(),
        }
    }
}

/// Result of inserting one row into a tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The key had no non-empty segments
    EmptyKey,
    /// An intermediate segment already holds a leaf
    Conflict { segment: String },
}

/// Nested string-keyed configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigTree {
    entries: BTreeMap<String, ConfigNode>,
}

impl ConfigTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from a JSON object (objects become branches)
    pub fn from_json(value: Value) -> Result<Self, ContentError> {
        match ConfigNode::from_value(value) {
            ConfigNode::Branch(tree) => Ok(tree),
            ConfigNode::Leaf(_) => Err(ContentError::invalid_configuration(
                "configuration root must be a JSON object",
            )),
        }
    }

    /// Insert a value under a dotted key
    ///
    /// Segments are trimmed and empty segments dropped. Intermediate branches
    /// are created on demand; the final segment is overwritten. Object values
    /// are stored as branches, the same shape `from_json` produces.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use folio_core::models::{ConfigTree, InsertOutcome};
    /// use serde_json::json;
    ///
    /// let mut tree = ConfigTree::new();
    /// tree.insert("seo. titleSuffix", json!(" | Blog"));
    /// assert_eq!(tree.to_json(), json!({ "seo": { "titleSuffix": " | Blog" } }));
    ///
    /// assert_eq!(tree.insert(" . ", json!("x")), InsertOutcome::EmptyKey);
    /// ```
    pub fn insert(&mut self, key: &str, value: Value) -> InsertOutcome {
        let segments = split_key(key);
        self.insert_path(&segments, value)
    }

    fn insert_path(&mut self, path: &[String], value: Value) -> InsertOutcome {
        match path {
            [] => InsertOutcome::EmptyKey,
            [leaf] => {
                self.entries.insert(leaf.clone(), ConfigNode::from_value(value));
                InsertOutcome::Inserted
            }
            [head, rest @ ..] => {
                let node = self
                    .entries
                    .entry(head.clone())
                    .or_insert_with(|| ConfigNode::Branch(ConfigTree::new()));
                match node {
                    ConfigNode::Branch(tree) => tree.insert_path(rest, value),
                    ConfigNode::Leaf(_) => InsertOutcome::Conflict {
                        segment: head.clone(),
                    },
                }
            }
        }
    }

    /// Look up a node by dotted path
    pub fn get(&self, key: &str) -> Option<&ConfigNode> {
        let segments = split_key(key);
        let (last, parents) = segments.split_last()?;
        let mut tree = self;
        for segment in parents {
            tree = tree.entries.get(segment)?.as_tree()?;
        }
        tree.entries.get(last)
    }

    /// Look up a string leaf by dotted path
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key)?.as_value()?.as_str()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ConfigNode)> {
        self.entries.iter()
    }

    /// Convert to a JSON object
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(key, node)| (key.clone(), node.to_json()))
                .collect(),
        )
    }

    /// Decode the tree into a typed settings struct
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, ContentError> {
        serde_json::from_value(self.to_json())
            .map_err(|e| ContentError::invalid_configuration(e.to_string()))
    }
}

/// Split a dotted key into trimmed, non-empty segments
pub fn split_key(key: &str) -> Vec<String> {
    key.split(CONFIG_KEY_DELIMITER)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// When a Value cell is JSON-decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueDecoding {
    /// Decode only rows whose `Type` cell is exactly `"JSON"`
    #[default]
    TypeColumn,
    /// Try every row
    Always,
    /// Keep every cell as a string
    Never,
}

/// `Type` cell value that opts a row into JSON decoding
pub const JSON_TYPE_LITERAL: &str = "JSON";

impl ValueDecoding {
    /// Turn a raw cell into a leaf value
    pub fn coerce(self, raw: String, type_cell: Option<&str>) -> Value {
        let attempt = match self {
            Self::Always => true,
            Self::Never => false,
            Self::TypeColumn => type_cell == Some(JSON_TYPE_LITERAL),
        };

        if attempt {
            decode_json_or_string(raw)
        } else {
            Value::String(raw)
        }
    }
}

/// Parse a cell as JSON, keeping the raw string when parsing fails
pub fn decode_json_or_string(raw: String) -> Value {
    match serde_json::from_str::<Value>(&raw) {
        Ok(value) => value,
        Err(_) => Value::String(raw),
    }
}

/// Typed view of the site-wide settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSettings {
    pub title: String,
    pub description: String,
    pub author: String,
    /// network name → profile URL
    pub social: BTreeMap<String, String>,
}
