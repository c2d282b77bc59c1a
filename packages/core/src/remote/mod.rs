//! Remote Record Access
//!
//! This module defines the `RecordClient` trait, the only seam between the
//! content repository and the remote block store. Everything above it
//! (accessors, the content index, the config resolver) works on `RawRecord`s
//! and never sees HTTP.
//!
//! # Implementations
//!
//! - `NotionClient`: HTTP client against the store's `api/v3` endpoints
//! - `InMemoryClient`: pre-seeded records, for local rendering and tests
//! - `FixtureCache`: decorator persisting fetched records to disk
//!
//! # Examples
//!
//! ```rust
//! use folio_core::models::{PageId, RawRecord};
//! use folio_core::remote::{FetchOptions, InMemoryClient, RecordClient};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), folio_core::ContentError> {
//! let client: Arc<dyn RecordClient> =
//!     Arc::new(InMemoryClient::new().with_record("page", RawRecord::default()));
//!
//! let record = client.fetch(&PageId::new("page"), FetchOptions::default()).await?;
//! assert!(record.block.is_empty());
//! # Ok(())
//! # }
//! ```

mod fixture_cache;
mod memory;
mod notion;

pub use fixture_cache::FixtureCache;
pub use memory::InMemoryClient;
pub use notion::NotionClient;

use crate::error::ContentError;
use crate::models::{PageId, RawRecord};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// What a fetch should resolve beyond the page's own chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchOptions {
    /// Fetch child blocks referenced but not returned by the page chunk
    pub fetch_missing_blocks: bool,

    /// Run the query of every collection view in the page
    pub fetch_collections: bool,

    /// Resolve signed URLs for file-like blocks
    pub sign_file_urls: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            fetch_missing_blocks: true,
            fetch_collections: true,
            sign_file_urls: true,
        }
    }
}

/// Fetches raw hierarchical records for pages
///
/// Implementations must be `Send + Sync`: a single client is shared by every
/// accessor through an `Arc<dyn RecordClient>` and called concurrently.
///
/// Fails with `ContentError::RemoteFetch` on network failure, an invalid or
/// unknown id, a non-success status or a malformed response. No retries.
#[async_trait]
pub trait RecordClient: Send + Sync {
    async fn fetch(&self, page_id: &PageId, options: FetchOptions)
        -> Result<RawRecord, ContentError>;
}
