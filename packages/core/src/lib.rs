//! Folio Content Repository Core
//!
//! This crate turns pages and databases stored in a remote block store (a
//! Notion workspace) into typed, slug-addressable content for a rendering
//! layer.
//!
//! # Architecture
//!
//! - **Opaque records**: a page is fetched as one `RawRecord` and handed to the
//!   renderer as-is; only properties and database rows are interpreted
//! - **Fetch once**: every record, enumeration and slug map is memoized in a
//!   single-flight cell, shared by concurrent callers, never refreshed
//! - **Explicit context**: `ContentIndex` and `ConfigResolver` are built from a
//!   `ContentConfig` and a shared `RecordClient`; there is no global state
//!
//! # Modules
//!
//! - [`models`] - Page ids, property values, record maps, entries, config trees
//! - [`remote`] - `RecordClient` trait with HTTP, in-memory and fixture-cache clients
//! - [`accessors`] - Memoized page and database accessors
//! - [`services`] - Entry reader, content index, config resolver
//! - [`config`] - Environment configuration
//! - [`utils`] - Single-flight memo cell

pub mod accessors;
pub mod config;
pub mod error;
pub mod models;
pub mod remote;
pub mod services;
pub mod utils;

#[cfg(test)]
mod test_fixtures;

// Re-export commonly used types
pub use accessors::{CollectionAccessor, PageAccessor};
pub use config::{ContentConfig, FixtureMode};
pub use error::ContentError;
pub use models::*;
pub use remote::{FetchOptions, FixtureCache, InMemoryClient, NotionClient, RecordClient};
pub use services::*;
