//! Content Repository Error Types
//!
//! A single error enum covers every failure the repository core can surface,
//! from remote fetches up to slug lookups.
//!
//! Errors are `Clone`: memoized fetches hand the same failure to every waiter,
//! so each variant carries owned context (strings, kinds) instead of foreign
//! error sources.

use crate::models::{EntryKind, PropertyKind};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Content repository errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContentError {
    /// The remote store could not produce a record for a page
    #[error("Failed to fetch page '{page_id}': {reason}")]
    RemoteFetch { page_id: String, reason: String },

    /// A required property has the wrong shape
    #[error("Property '{name}' is not a {expected}, got: {found}")]
    TypeMismatch {
        name: String,
        expected: PropertyKind,
        found: PropertyKind,
    },

    /// A timestamp property holds a number no calendar date can represent
    #[error("Property '{name}' holds an out-of-range timestamp: {millis}")]
    InvalidDate { name: String, millis: f64 },

    /// The kind property is neither recognized literal
    #[error("Invalid type \"{value}\" on page '{page_id}', expected \"Post\" or \"Content\"")]
    InvalidKind { page_id: String, value: String },

    /// Slug lookup miss
    #[error("{kind} with slug '{slug}' not found in content database")]
    NotFound { kind: EntryKind, slug: String },

    /// A required environment identifier is absent
    #[error("{variable} environment variable is not set")]
    MissingConfiguration { variable: String },

    /// Configuration present but unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Fixture cache I/O or decode failure
    #[error("Fixture cache error at {path}: {reason}")]
    Cache { path: PathBuf, reason: String },

    /// A memoized background task panicked or was aborted
    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

impl ContentError {
    /// Create a remote fetch error
    pub fn remote_fetch(page_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RemoteFetch {
            page_id: page_id.into(),
            reason: reason.into(),
        }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(name: impl Into<String>, expected: PropertyKind, found: PropertyKind) -> Self {
        Self::TypeMismatch {
            name: name.into(),
            expected,
            found,
        }
    }

    /// Create an out-of-range date error
    pub fn invalid_date(name: impl Into<String>, millis: f64) -> Self {
        Self::InvalidDate {
            name: name.into(),
            millis,
        }
    }

    /// Create an invalid kind error
    pub fn invalid_kind(page_id: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidKind {
            page_id: page_id.into(),
            value: value.into(),
        }
    }

    /// Create a not found error for a slug lookup
    pub fn not_found(kind: EntryKind, slug: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            slug: slug.into(),
        }
    }

    /// Create a missing configuration error
    pub fn missing_configuration(variable: impl Into<String>) -> Self {
        Self::MissingConfiguration {
            variable: variable.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Create a fixture cache error
    pub fn cache(path: &Path, reason: impl Into<String>) -> Self {
        Self::Cache {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Create a task failure error
    pub fn task_failed(msg: impl Into<String>) -> Self {
        Self::TaskFailed(msg.into())
    }

    /// Whether this error came from the remote store boundary
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteFetch { .. })
    }
}
