//! Content Index
//!
//! The content database as an explicit context object: built once per
//! process, never invalidated. Every derived view is memoized in its own
//! single-flight cell:
//!
//! - the full enumeration (`all_entries`), read with bounded concurrency
//! - one slug map per kind, built from the enumeration
//!
//! # Draft visibility
//!
//! Listings (`post_list`, `content_page_list`) only show published entries,
//! while slug lookups find drafts too so unpublished entries can be previewed
//! by URL.
//!
//! # Failure model
//!
//! Enumeration is fail-fast: one unreadable row fails `all_entries` and every
//! view built on it, for the lifetime of the index.
//!
//! # Examples
//!
//! ```rust,no_run
//! use folio_core::config::ContentConfig;
//! use folio_core::remote::NotionClient;
//! use folio_core::services::ContentIndex;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), folio_core::ContentError> {
//! let config = ContentConfig::from_env()?;
//! let client = Arc::new(NotionClient::from_config(&config)?);
//! let index = ContentIndex::new(&config, client)?;
//!
//! for post in index.post_list().await? {
//!     println!("{} {}", post.date, post.title);
//! }
//! let page = index.post_by_slug("hello-world").await?;
//! println!("{} blocks", page.body.block.len());
//! # Ok(())
//! # }
//! ```

use super::entry_reader::{EntryReader, EntrySchema};
use crate::accessors::{CollectionAccessor, PageAccessor};
use crate::config::ContentConfig;
use crate::error::ContentError;
use crate::models::{ContentEntry, ContentPage, EntryKind, PageId};
use crate::remote::RecordClient;
use crate::utils::{FlightState, SingleFlight};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

/// Lifecycle of the index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStatus {
    /// Bound to a database, nothing fetched yet
    DatabaseBound,
    /// Enumeration in flight
    EntriesLoading,
    /// Enumeration finished
    EntriesReady,
    /// Enumeration failed; terminal
    Failed,
}

/// An entry together with the accessor it was read from
#[derive(Debug, Clone)]
pub struct IndexedEntry {
    pub page: Arc<PageAccessor>,
    pub entry: ContentEntry,
}

type SlugMap = HashMap<String, IndexedEntry>;

struct IndexState {
    database: CollectionAccessor,
    client: Arc<dyn RecordClient>,
    reader: Arc<EntryReader>,
    fetch_concurrency: usize,
    entries: SingleFlight<Vec<IndexedEntry>>,
    posts_by_slug: SingleFlight<SlugMap>,
    pages_by_slug: SingleFlight<SlugMap>,
}

/// Memoized index over the content database
#[derive(Clone)]
pub struct ContentIndex {
    inner: Arc<IndexState>,
}

impl std::fmt::Debug for ContentIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentIndex")
            .field("database_page_id", self.database_page_id())
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl ContentIndex {
    /// Bind an index to the configured content database
    ///
    /// Fails with `MissingConfiguration` when `DATABASE_PAGE_ID` is unset.
    /// Nothing is fetched until the first query.
    pub fn new(config: &ContentConfig, client: Arc<dyn RecordClient>) -> Result<Self, ContentError> {
        Self::with_entry_schema(config, client, EntrySchema::default())
    }

    /// Bind an index whose database uses custom property names
    pub fn with_entry_schema(
        config: &ContentConfig,
        client: Arc<dyn RecordClient>,
        schema: EntrySchema,
    ) -> Result<Self, ContentError> {
        config.validate()?;
        let database_page_id = config.require_database_page_id()?.clone();

        tracing::debug!(database_id = %database_page_id, "Content index bound");

        Ok(Self {
            inner: Arc::new(IndexState {
                database: CollectionAccessor::new(database_page_id, Arc::clone(&client)),
                client,
                reader: Arc::new(EntryReader::new(schema)),
                fetch_concurrency: config.fetch_concurrency,
                entries: SingleFlight::new(),
                posts_by_slug: SingleFlight::new(),
                pages_by_slug: SingleFlight::new(),
            }),
        })
    }

    pub fn database_page_id(&self) -> &PageId {
        self.inner.database.page_id()
    }

    pub fn status(&self) -> IndexStatus {
        match self.inner.entries.state() {
            FlightState::Idle => IndexStatus::DatabaseBound,
            FlightState::InFlight => IndexStatus::EntriesLoading,
            FlightState::Ready => IndexStatus::EntriesReady,
            FlightState::Failed => IndexStatus::Failed,
        }
    }

    /// Every row of the database, in view order, read exactly once
    pub async fn all_entries(&self) -> Result<Arc<Vec<IndexedEntry>>, ContentError> {
        let state = Arc::clone(&self.inner);
        self.inner
            .entries
            .get_or_init(move || async move { state.load_entries().await })
            .await
    }

    /// Published posts, newest first
    ///
    /// Posts sharing a date keep their database order.
    pub async fn post_list(&self) -> Result<Vec<ContentEntry>, ContentError> {
        let mut posts = self.listed(EntryKind::Post).await?;
        posts.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(posts)
    }

    /// Published content pages, by title
    pub async fn content_page_list(&self) -> Result<Vec<ContentEntry>, ContentError> {
        let mut pages = self.listed(EntryKind::Page).await?;
        pages.sort_by(|a, b| compare_titles(&a.title, &b.title));
        Ok(pages)
    }

    /// Look up a post by slug, drafts included
    pub async fn post_by_slug(&self, slug: &str) -> Result<ContentPage, ContentError> {
        self.by_slug(EntryKind::Post, slug).await
    }

    /// Look up a content page by slug, drafts included
    pub async fn content_page_by_slug(&self, slug: &str) -> Result<ContentPage, ContentError> {
        self.by_slug(EntryKind::Page, slug).await
    }

    async fn listed(&self, kind: EntryKind) -> Result<Vec<ContentEntry>, ContentError> {
        let entries = self.all_entries().await?;
        Ok(entries
            .iter()
            .filter(|indexed| indexed.entry.is_listed(kind))
            .map(|indexed| indexed.entry.clone())
            .collect())
    }

    async fn by_slug(&self, kind: EntryKind, slug: &str) -> Result<ContentPage, ContentError> {
        let map = self.slug_map(kind).await?;
        let indexed = map
            .get(slug)
            .ok_or_else(|| ContentError::not_found(kind, slug))?;

        Ok(ContentPage {
            metadata: indexed.entry.clone(),
            body: indexed.page.record().await?,
        })
    }

    async fn slug_map(&self, kind: EntryKind) -> Result<Arc<SlugMap>, ContentError> {
        let cell = match kind {
            EntryKind::Post => &self.inner.posts_by_slug,
            EntryKind::Page => &self.inner.pages_by_slug,
        };
        let index = self.clone();
        cell.get_or_init(move || async move {
            let entries = index.all_entries().await?;
            Ok(build_slug_map(&entries, kind))
        })
        .await
    }
}

impl IndexState {
    async fn load_entries(&self) -> Result<Vec<IndexedEntry>, ContentError> {
        let ids = self.database.child_page_ids().await?;
        tracing::info!(
            database_id = %self.database.page_id(),
            rows = ids.len(),
            concurrency = self.fetch_concurrency,
            "Loading content entries"
        );

        let client = Arc::clone(&self.client);
        let reader = Arc::clone(&self.reader);
        let entries: Vec<IndexedEntry> = stream::iter(ids)
            .map(move |page_id| {
                let page = Arc::new(PageAccessor::new(page_id, Arc::clone(&client)));
                let reader = Arc::clone(&reader);
                async move {
                    let entry = reader.read(&page).await?;
                    Ok::<_, ContentError>(IndexedEntry { page, entry })
                }
            })
            .buffered(self.fetch_concurrency)
            .try_collect()
            .await
            .map_err(|e| {
                tracing::warn!(
                    database_id = %self.database.page_id(),
                    error = %e,
                    "Content enumeration failed"
                );
                e
            })?;

        tracing::info!(
            database_id = %self.database.page_id(),
            entries = entries.len(),
            "Content entries ready"
        );
        Ok(entries)
    }
}

/// Slug → entry for one kind; on duplicates the later row wins
fn build_slug_map(entries: &[IndexedEntry], kind: EntryKind) -> SlugMap {
    let mut map = SlugMap::new();
    for indexed in entries.iter().filter(|indexed| indexed.entry.kind == kind) {
        let slug = indexed.entry.slug.clone();
        if let Some(previous) = map.insert(slug, indexed.clone()) {
            tracing::warn!(
                kind = %kind,
                slug = %indexed.entry.slug,
                replaced = %previous.entry.page_id,
                page_id = %indexed.entry.page_id,
                "Duplicate slug, later entry wins"
            );
        }
    }
    map
}

/// Case-insensitive title order with a byte-order tiebreak
fn compare_titles(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
