//! In-memory record client
//!
//! Serves pre-seeded records without touching the network. Used for local
//! rendering from exported records and throughout the test suite, where the
//! per-page call counter is how single-flight behaviour is observed.

use super::{FetchOptions, RecordClient};
use crate::error::ContentError;
use crate::models::{PageId, RawRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Record client backed by a map
#[derive(Debug, Default)]
pub struct InMemoryClient {
    records: HashMap<PageId, RawRecord>,
    failures: HashMap<PageId, String>,
    latency: Option<Duration>,
    calls: Mutex<HashMap<PageId, usize>>,
}

impl InMemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `record` for `page_id`
    pub fn with_record(mut self, page_id: impl AsRef<str>, record: RawRecord) -> Self {
        self.records.insert(PageId::new(page_id), record);
        self
    }

    /// Fail every fetch of `page_id` with a `RemoteFetch` error
    pub fn with_failure(mut self, page_id: impl AsRef<str>, reason: impl Into<String>) -> Self {
        self.failures.insert(PageId::new(page_id), reason.into());
        self
    }

    /// Delay every fetch, to widen race windows in tests
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of fetches issued for `page_id`
    pub fn call_count(&self, page_id: impl AsRef<str>) -> usize {
        let calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
        calls.get(&PageId::new(page_id)).copied().unwrap_or(0)
    }

    /// Number of fetches issued across all pages
    pub fn total_calls(&self) -> usize {
        let calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
        calls.values().sum()
    }
}

#[async_trait]
impl RecordClient for InMemoryClient {
    async fn fetch(
        &self,
        page_id: &PageId,
        _options: FetchOptions,
    ) -> Result<RawRecord, ContentError> {
        {
            let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
            *calls.entry(page_id.clone()).or_insert(0) += 1;
        }

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if let Some(reason) = self.failures.get(page_id) {
            return Err(ContentError::remote_fetch(page_id.as_str(), reason.clone()));
        }

        self.records
            .get(page_id)
            .cloned()
            .ok_or_else(|| ContentError::remote_fetch(page_id.as_str(), "page not found"))
    }
}
