//! Page identifiers
//!
//! The remote store keys blocks by lowercase hyphenated UUIDs, but page ids
//! copied out of share links are usually 32 bare hex digits. `PageId`
//! normalizes both spellings to the block-key form and keeps anything else
//! verbatim, so it stays an opaque identifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque identifier of a page in the remote store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(String);

impl PageId {
    /// Create a page id, normalizing UUID spellings
    ///
    /// # Examples
    ///
    /// ```rust
    /// use folio_core::models::PageId;
    ///
    /// let id = PageId::new("8C4D7A2E91F04B6BA3E5D2C1F0E9A8B7");
    /// assert_eq!(id.as_str(), "8c4d7a2e-91f0-4b6b-a3e5-d2c1f0e9a8b7");
    ///
    /// let opaque = PageId::new("not-a-uuid");
    /// assert_eq!(opaque.as_str(), "not-a-uuid");
    /// ```
    pub fn new(raw: impl AsRef<str>) -> Self {
        let trimmed = raw.as_ref().trim();
        match Uuid::try_parse(trimmed) {
            Ok(uuid) => Self(uuid.hyphenated().to_string()),
            Err(_) => Self(trimmed.to_string()),
        }
    }

    /// Borrow the normalized id
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id is empty after trimming
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Id without hyphens, the spelling used in page URLs and cache file names
    pub fn compact(&self) -> String {
        self.0.replace('-', "")
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PageId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for PageId {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl AsRef<str> for PageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
