//! Page Accessor
//!
//! Wraps one page id and reads typed properties off its record. The record is
//! fetched lazily, once: the first reader triggers the fetch and every other
//! reader (concurrent or later) shares the same record or the same error.
//!
//! # Property readers
//!
//! | Reader            | Accepts          | Returns              |
//! |-------------------|------------------|----------------------|
//! | `raw_property`    | anything         | `PropertyValue`      |
//! | `string_property` | `String`         | `String`             |
//! | `number_property` | `Number`         | `f64`                |
//! | `date_property`   | `Number` (ms)    | `NaiveDate` (UTC)    |
//! | `tags_property`   | `StringList`     | `Vec<String>`        |
//!
//! Any other shape fails with `ContentError::TypeMismatch`.

use crate::error::ContentError;
use crate::models::{PageId, PropertyKind, PropertyValue, RawRecord};
use crate::remote::{FetchOptions, RecordClient};
use crate::utils::{FlightState, SingleFlight};
use chrono::{DateTime, NaiveDate};
use std::sync::Arc;

/// Lazily fetched view of one page
pub struct PageAccessor {
    page_id: PageId,
    client: Arc<dyn RecordClient>,
    options: FetchOptions,
    record: SingleFlight<RawRecord>,
}

impl std::fmt::Debug for PageAccessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageAccessor")
            .field("page_id", &self.page_id)
            .field("options", &self.options)
            .field("record", &self.record)
            .finish_non_exhaustive()
    }
}

impl PageAccessor {
    pub fn new(page_id: PageId, client: Arc<dyn RecordClient>) -> Self {
        Self {
            page_id,
            client,
            options: FetchOptions::default(),
            record: SingleFlight::new(),
        }
    }

    /// Override what the fetch resolves
    pub fn with_options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn page_id(&self) -> &PageId {
        &self.page_id
    }

    /// State of the memoized fetch
    pub fn fetch_state(&self) -> FlightState {
        self.record.state()
    }

    /// The page record, fetched at most once per accessor
    pub async fn fetch_cached(&self) -> Result<Arc<RawRecord>, ContentError> {
        let client = Arc::clone(&self.client);
        let page_id = self.page_id.clone();
        let options = self.options;

        self.record
            .get_or_init(move || async move {
                tracing::debug!(page_id = %page_id, "Fetching page record");
                let result = client.fetch(&page_id, options).await;
                if let Err(e) = &result {
                    tracing::warn!(page_id = %page_id, error = %e, "Page fetch failed");
                }
                result
            })
            .await
    }

    /// Full record body, for rendering
    pub async fn record(&self) -> Result<Arc<RawRecord>, ContentError> {
        self.fetch_cached().await
    }

    /// Read a property without shape validation
    ///
    /// `Absent` when the page block, its collection or the named property is
    /// missing from the record.
    pub async fn raw_property(&self, name: &str) -> Result<PropertyValue, ContentError> {
        let record = self.fetch_cached().await?;
        Ok(record.property(self.page_id.as_str(), name))
    }

    pub async fn string_property(&self, name: &str) -> Result<String, ContentError> {
        match self.raw_property(name).await? {
            PropertyValue::String(value) => Ok(value),
            other => Err(mismatch(name, PropertyKind::String, &other)),
        }
    }

    pub async fn number_property(&self, name: &str) -> Result<f64, ContentError> {
        match self.raw_property(name).await? {
            PropertyValue::Number(value) => Ok(value),
            other => Err(mismatch(name, PropertyKind::Number, &other)),
        }
    }

    /// Read a date property as a UTC calendar date
    pub async fn date_property(&self, name: &str) -> Result<NaiveDate, ContentError> {
        match self.raw_property(name).await? {
            PropertyValue::Number(millis) => {
                timestamp_to_date(millis).ok_or_else(|| ContentError::invalid_date(name, millis))
            }
            other => Err(mismatch(name, PropertyKind::Number, &other)),
        }
    }

    pub async fn tags_property(&self, name: &str) -> Result<Vec<String>, ContentError> {
        match self.raw_property(name).await? {
            PropertyValue::StringList(tags) => Ok(tags),
            other => Err(mismatch(name, PropertyKind::StringList, &other)),
        }
    }
}

fn mismatch(name: &str, expected: PropertyKind, found: &PropertyValue) -> ContentError {
    ContentError::type_mismatch(name, expected, found.kind())
}

/// UTC calendar date of an epoch-milliseconds timestamp
fn timestamp_to_date(millis: f64) -> Option<NaiveDate> {
    if !millis.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(millis as i64).map(|dt| dt.date_naive())
}
