//! Content Entry Reader
//!
//! Interprets one database row as a `ContentEntry`. All six properties are
//! read concurrently off the same memoized record; any failure except the
//! status read fails the entry.

use crate::accessors::PageAccessor;
use crate::error::ContentError;
use crate::models::{ContentEntry, EntryKind, EntryStatus, PropertyValue};
use serde::{Deserialize, Serialize};

/// Property names of the content database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntrySchema {
    pub title: String,
    pub slug: String,
    pub date: String,
    pub status: String,
    pub kind: String,
    pub tags: String,
}

impl Default for EntrySchema {
    fn default() -> Self {
        Self {
            title: "Title".to_string(),
            slug: "Slug".to_string(),
            date: "Date".to_string(),
            status: "Status".to_string(),
            kind: "Type".to_string(),
            tags: "Tags".to_string(),
        }
    }
}

/// Reads content entries off page accessors
#[derive(Debug, Clone, Default)]
pub struct EntryReader {
    schema: EntrySchema,
}

impl EntryReader {
    pub fn new(schema: EntrySchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &EntrySchema {
        &self.schema
    }

    /// Read and validate one entry
    ///
    /// # Errors
    ///
    /// - `RemoteFetch` when the page record cannot be fetched
    /// - `TypeMismatch` when title, slug, kind, date or tags has the wrong shape
    /// - `InvalidDate` when the date is a timestamp outside the calendar range
    /// - `InvalidKind` when the kind is neither `"Post"` nor `"Content"`
    ///
    /// An unrecognized status never fails the read; it becomes `Draft` and
    /// is logged.
    pub async fn read(&self, page: &PageAccessor) -> Result<ContentEntry, ContentError> {
        let schema = &self.schema;
        let (title, slug, date, status, kind, tags) = tokio::try_join!(
            page.string_property(&schema.title),
            page.string_property(&schema.slug),
            page.date_property(&schema.date),
            page.raw_property(&schema.status),
            page.string_property(&schema.kind),
            page.tags_property(&schema.tags),
        )?;

        let page_id = page.page_id().clone();
        let kind = kind
            .parse::<EntryKind>()
            .map_err(|_| ContentError::invalid_kind(page_id.as_str(), kind.clone()))?;

        let status = match &status {
            PropertyValue::String(raw) => EntryStatus::parse(raw),
            _ => None,
        }
        .unwrap_or_else(|| {
            tracing::warn!(
                page_id = %page_id,
                title = %title,
                slug = %slug,
                status = %status,
                "Unrecognized status, treating entry as Draft"
            );
            EntryStatus::Draft
        });

        Ok(ContentEntry {
            page_id,
            title,
            slug,
            date,
            status,
            kind,
            tags,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PageId, PropertyKind};
    use crate::remote::InMemoryClient;
    use crate::test_fixtures::{entry_record, orphan_row, EntryRow};
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn page_for(row: &EntryRow<'_>) -> PageAccessor {
        let client = Arc::new(InMemoryClient::new().with_record(row.id, entry_record(row)));
        PageAccessor::new(PageId::new(row.id), client)
    }

    #[tokio::test]
    async fn test_reads_published_post() {
        let row = EntryRow::post("post-1", "hello-world", "2024-05-01").tags(&["rust", "web"]);
        let entry = EntryReader::default().read(&page_for(&row)).await.unwrap();

        assert_eq!(entry.page_id, PageId::new("post-1"));
        assert_eq!(entry.title, "hello-world");
        assert_eq!(entry.slug, "hello-world");
        assert_eq!(entry.date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(entry.status, EntryStatus::Published);
        assert_eq!(entry.kind, EntryKind::Post);
        assert_eq!(entry.tags, vec!["rust", "web"]);
    }

    #[tokio::test]
    async fn test_content_kind_is_page() {
        let row = EntryRow::page("about", "about", "About");
        let entry = EntryReader::default().read(&page_for(&row)).await.unwrap();
        assert_eq!(entry.kind, EntryKind::Page);
    }

    #[tokio::test]
    async fn test_unknown_status_defaults_to_draft() {
        for status in [Some("Archived"), Some("PUBLISHED"), None] {
            let row = EntryRow::post("post-1", "hello", "2024-05-01").status(status);
            let entry = EntryReader::default().read(&page_for(&row)).await.unwrap();
            assert_eq!(entry.status, EntryStatus::Draft, "status {:?}", status);
        }
    }

    #[tokio::test]
    async fn test_lowercase_status_literals() {
        let row = EntryRow::post("post-1", "hello", "2024-05-01").status(Some("published"));
        let entry = EntryReader::default().read(&page_for(&row)).await.unwrap();
        assert_eq!(entry.status, EntryStatus::Published);

        let row = EntryRow::post("post-1", "hello", "2024-05-01").status(Some("draft"));
        let entry = EntryReader::default().read(&page_for(&row)).await.unwrap();
        assert_eq!(entry.status, EntryStatus::Draft);
    }

    #[tokio::test]
    async fn test_invalid_kind() {
        let row = EntryRow::post("post-1", "hello", "2024-05-01").kind("Newsletter");
        let err = EntryReader::default().read(&page_for(&row)).await.unwrap_err();

        assert_eq!(err, ContentError::invalid_kind("post-1", "Newsletter"));
        assert!(err.to_string().contains("Newsletter"));
    }

    #[tokio::test]
    async fn test_missing_date_fails_entry() {
        let row = EntryRow::post("post-1", "hello", "not-a-date");
        let err = EntryReader::default().read(&page_for(&row)).await.unwrap_err();

        assert_eq!(
            err,
            ContentError::type_mismatch("Date", PropertyKind::Number, PropertyKind::Absent)
        );
    }

    #[tokio::test]
    async fn test_page_outside_database_fails() {
        let client = Arc::new(InMemoryClient::new().with_record("loose", orphan_row("loose")));
        let page = PageAccessor::new(PageId::new("loose"), client);

        let err = EntryReader::default().read(&page).await.unwrap_err();
        assert!(matches!(err, ContentError::TypeMismatch { .. }));
    }

    #[tokio::test]
    async fn test_custom_schema_names() {
        let schema = EntrySchema {
            title: "Slug".to_string(),
            ..EntrySchema::default()
        };
        let row = EntryRow::page("about", "about", "About us");
        let entry = EntryReader::new(schema).read(&page_for(&row)).await.unwrap();

        assert_eq!(entry.title, "about");
    }

    #[tokio::test]
    async fn test_single_fetch_per_entry() {
        let row = EntryRow::post("post-1", "hello", "2024-05-01");
        let client = Arc::new(InMemoryClient::new().with_record("post-1", entry_record(&row)));
        let page = PageAccessor::new(PageId::new("post-1"), client.clone());

        EntryReader::default().read(&page).await.unwrap();
        assert_eq!(client.call_count("post-1"), 1);
    }
}
