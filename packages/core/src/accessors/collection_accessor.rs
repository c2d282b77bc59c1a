//! Collection Accessor
//!
//! A database page seen as an ordered list of row pages. Row order is the
//! order of the database's single view query, so listings built on top keep
//! whatever sort the view applies.

use super::PageAccessor;
use crate::error::ContentError;
use crate::models::{PageId, RawRecord};
use crate::remote::RecordClient;
use std::sync::Arc;

/// Accessor over a database page
#[derive(Debug)]
pub struct CollectionAccessor {
    page: PageAccessor,
}

impl CollectionAccessor {
    pub fn new(page_id: PageId, client: Arc<dyn RecordClient>) -> Self {
        Self::from_page(PageAccessor::new(page_id, client))
    }

    pub fn from_page(page: PageAccessor) -> Self {
        Self { page }
    }

    pub fn page(&self) -> &PageAccessor {
        &self.page
    }

    pub fn page_id(&self) -> &PageId {
        self.page.page_id()
    }

    /// Ordered ids of the database rows
    ///
    /// Empty (not an error) when the record has no collection, view or
    /// query result.
    pub async fn child_page_ids(&self) -> Result<Vec<PageId>, ContentError> {
        let record = self.page.fetch_cached().await?;
        let ids = record.child_page_ids(self.page.page_id().as_str());
        tracing::debug!(
            database_id = %self.page.page_id(),
            rows = ids.len(),
            "Listed database rows"
        );
        Ok(ids)
    }

    /// Record of the database page itself
    pub async fn record(&self) -> Result<Arc<RawRecord>, ContentError> {
        self.page.fetch_cached().await
    }
}
