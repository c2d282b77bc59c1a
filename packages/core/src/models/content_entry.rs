//! Content entries
//!
//! `ContentEntry` is the typed metadata the rendering layer lists and links
//! to; `ContentPage` pairs it with the full record body for single-page
//! rendering.

use crate::models::{PageId, RawRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Publication status of an entry
///
/// Both `"published"`/`"draft"` and the capitalized select labels are
/// recognized; anything else reads as `Draft`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EntryStatus {
    Published,
    #[default]
    Draft,
}

impl EntryStatus {
    /// Map a raw status cell; `None` when the value is not a recognized literal
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "published" | "Published" => Some(Self::Published),
            "draft" | "Draft" => Some(Self::Draft),
            _ => None,
        }
    }

    pub fn is_published(self) -> bool {
        self == Self::Published
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Published => write!(f, "Published"),
            Self::Draft => write!(f, "Draft"),
        }
    }
}

/// Post vs static content page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    /// Dated blog post, stored as `"Post"`
    Post,
    /// Static content page, stored as `"Content"`
    #[serde(rename = "Content")]
    Page,
}

impl EntryKind {
    /// Literal used in the content database
    pub fn as_literal(self) -> &'static str {
        match self {
            Self::Post => "Post",
            Self::Page => "Content",
        }
    }
}

impl FromStr for EntryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Post" => Ok(Self::Post),
            "Content" => Ok(Self::Page),
            _ => Err(format!("Invalid entry type: {}", s)),
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Post => write!(f, "Post"),
            Self::Page => write!(f, "Content page"),
        }
    }
}

/// Typed metadata of one database row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentEntry {
    pub page_id: PageId,

    pub title: String,

    /// URL segment, unique within its kind
    pub slug: String,

    /// Serialized as `YYYY-MM-DD`
    pub date: NaiveDate,

    pub status: EntryStatus,

    #[serde(rename = "type")]
    pub kind: EntryKind,

    pub tags: Vec<String>,
}

impl ContentEntry {
    /// Whether this entry shows up in listings of `kind`
    pub fn is_listed(&self, kind: EntryKind) -> bool {
        self.kind == kind && self.status.is_published()
    }
}

/// A single entry ready for rendering
#[derive(Debug, Clone)]
pub struct ContentPage {
    pub metadata: ContentEntry,

    /// Full record of the page, blocks included
    pub body: Arc<RawRecord>,
}
