//! Property values read off a page block
//!
//! Pages carry a loosely typed property bag. Everything the repository reads
//! out of it is narrowed to one of four shapes here, and the typed readers on
//! `PageAccessor` match on the tag instead of guessing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A decoded page property
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PropertyValue {
    /// Text-like properties (title, rich text, select, url, checkbox, ...)
    String(String),
    /// Numeric properties and timestamps (epoch milliseconds)
    Number(f64),
    /// Multi-select properties
    StringList(Vec<String>),
    /// Property missing from the schema or the block
    #[default]
    Absent,
}

impl PropertyValue {
    /// Shape tag of this value
    pub fn kind(&self) -> PropertyKind {
        match self {
            Self::String(_) => PropertyKind::String,
            Self::Number(_) => PropertyKind::Number,
            Self::StringList(_) => PropertyKind::StringList,
            Self::Absent => PropertyKind::Absent,
        }
    }

    /// Borrow the string payload, if any
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Consume into the string payload, if any
    pub fn into_string(self) -> Option<String> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Whether the property was not found
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{}", s),
            Self::Number(n) => write!(f, "{}", n),
            Self::StringList(list) => write!(f, "{}", list.join(",")),
            Self::Absent => write!(f, "<absent>"),
        }
    }
}

/// Shape tag of a `PropertyValue`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    String,
    Number,
    StringList,
    Absent,
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Number => write!(f, "number"),
            Self::StringList => write!(f, "string list"),
            Self::Absent => write!(f, "absent"),
        }
    }
}
