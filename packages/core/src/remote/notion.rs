//! HTTP record client for the Notion `api/v3` endpoints
//!
//! A page fetch is a small pipeline over four endpoints:
//!
//! 1. `loadPageChunk` in a cursor loop, merging every chunk's record map
//! 2. `syncRecordValues` for child blocks referenced but not yet loaded
//! 3. `queryCollection` for every view of every database block
//! 4. `getSignedFileUrls` for file-like blocks stored in secure storage
//!
//! Steps 2-4 are switched by `FetchOptions`. Any failure along the way fails
//! the whole fetch with `ContentError::RemoteFetch`; nothing is retried.

use super::{FetchOptions, RecordClient};
use crate::config::ContentConfig;
use crate::error::ContentError;
use crate::models::{CollectionQueryResult, PageId, RawRecord};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Blocks requested per `loadPageChunk` call
const CHUNK_LIMIT: usize = 100;

/// Upper bound on `loadPageChunk` calls per page
const MAX_PAGE_CHUNKS: usize = 20;

/// Upper bound on `syncRecordValues` rounds per page
const MAX_SYNC_ROUNDS: usize = 8;

/// Rows requested per view query
const QUERY_RESULT_LIMIT: usize = 999;

/// Block types whose source may need a signed URL
const FILE_BLOCK_TYPES: &[&str] = &["image", "file", "pdf", "video", "audio"];

/// Host fragments of the store's private file storage
const SECURE_STORAGE_HOSTS: &[&str] = &["secure.notion-static.com", "prod-files-secure"];

/// Record client for the Notion private API
#[derive(Clone)]
pub struct NotionClient {
    client: Client,
    base_url: String,
}

impl fmt::Debug for NotionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotionClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Cursor {
    #[serde(default)]
    stack: Vec<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PageChunkRequest<'a> {
    page_id: &'a str,
    limit: usize,
    cursor: &'a Cursor,
    chunk_number: usize,
    vertical_columns: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageChunkResponse {
    #[serde(default)]
    record_map: Value,
    #[serde(default)]
    cursor: Cursor,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordMapResponse {
    #[serde(default)]
    record_map: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryCollectionResponse {
    #[serde(default)]
    result: QueryEnvelope,
    #[serde(default)]
    record_map: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryEnvelope {
    #[serde(default)]
    reducer_results: CollectionQueryResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignedUrlsResponse {
    #[serde(default)]
    signed_urls: Vec<String>,
}

/// One database view to query
#[derive(Debug, Clone, PartialEq, Eq)]
struct CollectionTarget {
    collection_id: String,
    view_id: String,
    space_id: Option<String>,
}

impl NotionClient {
    /// Create a client against `base_url` (e.g. `https://www.notion.so/api/v3`)
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ContentError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            ContentError::invalid_configuration(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ContentConfig) -> Result<Self, ContentError> {
        Self::new(config.api_base_url.clone(), config.request_timeout)
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    /// POST a JSON body and decode the JSON response
    async fn post<B, R>(&self, page_id: &PageId, endpoint: &str, body: &B) -> Result<R, ContentError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.endpoint_url(endpoint))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                let reason = if e.is_timeout() {
                    format!("{} timed out: {}", endpoint, e)
                } else if e.is_connect() {
                    format!("connection failed for {}: {}", endpoint, e)
                } else {
                    format!("{} request failed: {}", endpoint, e)
                };
                ContentError::remote_fetch(page_id.as_str(), reason)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ContentError::remote_fetch(
                page_id.as_str(),
                format!("{} returned {}: {}", endpoint, status, body),
            ));
        }

        response.json::<R>().await.map_err(|e| {
            ContentError::remote_fetch(
                page_id.as_str(),
                format!("malformed {} response: {}", endpoint, e),
            )
        })
    }

    async fn load_page_chunks(&self, page_id: &PageId) -> Result<RawRecord, ContentError> {
        let mut record = RawRecord::default();
        let mut cursor = Cursor::default();

        for chunk_number in 0..MAX_PAGE_CHUNKS {
            let request = PageChunkRequest {
                page_id: page_id.as_str(),
                limit: CHUNK_LIMIT,
                cursor: &cursor,
                chunk_number,
                vertical_columns: false,
            };
            let response: PageChunkResponse =
                self.post(page_id, "loadPageChunk", &request).await?;

            record.merge(decode_record_map(page_id, response.record_map)?);

            if response.cursor.stack.is_empty() {
                break;
            }
            cursor = response.cursor;
        }

        if record.block(page_id.as_str()).is_none() {
            return Err(ContentError::remote_fetch(page_id.as_str(), "page not found"));
        }

        tracing::debug!(
            page_id = %page_id,
            blocks = record.block.len(),
            "Loaded page chunks"
        );
        Ok(record)
    }

    async fn fetch_missing_blocks(
        &self,
        page_id: &PageId,
        record: &mut RawRecord,
    ) -> Result<(), ContentError> {
        for _ in 0..MAX_SYNC_ROUNDS {
            let missing = missing_block_ids(record);
            if missing.is_empty() {
                return Ok(());
            }

            tracing::debug!(page_id = %page_id, count = missing.len(), "Syncing missing blocks");

            let requests: Vec<Value> = missing
                .iter()
                .map(|id| json!({ "pointer": { "table": "block", "id": id }, "version": -1 }))
                .collect();
            let response: RecordMapResponse = self
                .post(page_id, "syncRecordValues", &json!({ "requests": requests }))
                .await?;

            let synced = decode_record_map(page_id, response.record_map)?;
            if synced.block.is_empty() {
                // Nothing new came back; stop instead of asking again
                return Ok(());
            }
            record.merge(synced);
        }
        Ok(())
    }

    async fn fetch_collections(
        &self,
        page_id: &PageId,
        record: &mut RawRecord,
    ) -> Result<(), ContentError> {
        let targets = collection_targets(record);
        let queries = targets
            .into_iter()
            .map(|target| async move {
                let response = self.query_collection(page_id, &target).await?;
                Ok::<_, ContentError>((target, response))
            });
        let results = futures::future::try_join_all(queries).await?;

        for (target, response) in results {
            record.merge(decode_record_map(page_id, response.record_map)?);
            record
                .collection_query
                .entry(target.collection_id)
                .or_default()
                .insert(target.view_id, response.result.reducer_results);
        }
        Ok(())
    }

    async fn query_collection(
        &self,
        page_id: &PageId,
        target: &CollectionTarget,
    ) -> Result<QueryCollectionResponse, ContentError> {
        tracing::debug!(
            page_id = %page_id,
            collection_id = %target.collection_id,
            view_id = %target.view_id,
            "Querying collection view"
        );

        let body = json!({
            "collection": { "id": target.collection_id, "spaceId": target.space_id },
            "collectionView": { "id": target.view_id, "spaceId": target.space_id },
            "loader": {
                "type": "reducer",
                "reducers": {
                    "collection_group_results": { "type": "results", "limit": QUERY_RESULT_LIMIT }
                },
                "searchQuery": "",
                "userTimeZone": "UTC"
            }
        });
        self.post(page_id, "queryCollection", &body).await
    }

    async fn sign_file_urls(
        &self,
        page_id: &PageId,
        record: &mut RawRecord,
    ) -> Result<(), ContentError> {
        let files = signable_files(record);
        if files.is_empty() {
            return Ok(());
        }

        let urls: Vec<Value> = files
            .iter()
            .map(|(block_id, url)| {
                json!({ "permissionRecord": { "table": "block", "id": block_id }, "url": url })
            })
            .collect();
        let response: SignedUrlsResponse = self
            .post(page_id, "getSignedFileUrls", &json!({ "urls": urls }))
            .await?;

        for ((block_id, _), signed) in files.into_iter().zip(response.signed_urls) {
            record.signed_urls.insert(block_id, signed);
        }
        Ok(())
    }
}

#[async_trait]
impl RecordClient for NotionClient {
    async fn fetch(
        &self,
        page_id: &PageId,
        options: FetchOptions,
    ) -> Result<RawRecord, ContentError> {
        if Uuid::try_parse(page_id.as_str()).is_err() {
            return Err(ContentError::remote_fetch(
                page_id.as_str(),
                "invalid page id, expected a UUID",
            ));
        }

        let mut record = self.load_page_chunks(page_id).await?;

        if options.fetch_missing_blocks {
            self.fetch_missing_blocks(page_id, &mut record).await?;
        }
        if options.fetch_collections {
            self.fetch_collections(page_id, &mut record).await?;
        }
        if options.sign_file_urls {
            self.sign_file_urls(page_id, &mut record).await?;
        }

        tracing::info!(
            page_id = %page_id,
            blocks = record.block.len(),
            collections = record.collection.len(),
            "Fetched page record"
        );
        Ok(record)
    }
}

/// Decode a response record map, tolerating absent maps and double wrapping
fn decode_record_map(page_id: &PageId, mut value: Value) -> Result<RawRecord, ContentError> {
    if value.is_null() {
        return Ok(RawRecord::default());
    }
    unwrap_nested_entries(&mut value);
    serde_json::from_value(value).map_err(|e| {
        ContentError::remote_fetch(page_id.as_str(), format!("malformed record map: {}", e))
    })
}

/// Collapse `{ value: { value, role } }` entries into `{ value, role }`
///
/// Some endpoints wrap every record map entry one level deeper than others.
fn unwrap_nested_entries(record_map: &mut Value) {
    let Some(tables) = record_map.as_object_mut() else {
        return;
    };

    for table in tables.values_mut() {
        let Some(entries) = table.as_object_mut() else {
            continue;
        };
        for entry in entries.values_mut() {
            let inner = entry
                .get_mut("value")
                .filter(|value| value.get("value").is_some() && value.get("role").is_some())
                .map(Value::take);
            if let Some(inner) = inner {
                *entry = inner;
            }
        }
    }
}

/// Child ids referenced by loaded blocks but absent from the block table
fn missing_block_ids(record: &RawRecord) -> Vec<String> {
    let missing: BTreeSet<&String> = record
        .block
        .values()
        .filter_map(|entry| entry.value.as_ref())
        .filter_map(|block| block.content.as_ref())
        .flatten()
        .filter(|id| !record.block.contains_key(id.as_str()))
        .collect();

    missing.into_iter().cloned().collect()
}

/// Every (collection, view) pair of the database blocks in a record
fn collection_targets(record: &RawRecord) -> Vec<CollectionTarget> {
    record
        .block
        .values()
        .filter_map(|entry| entry.value.as_ref())
        .filter(|block| block.is_database())
        .flat_map(|block| {
            let collection_id = block.database_collection_id().map(str::to_string);
            block
                .view_ids
                .iter()
                .flatten()
                .filter_map(move |view_id| {
                    Some(CollectionTarget {
                        collection_id: collection_id.clone()?,
                        view_id: view_id.clone(),
                        space_id: block.space_id.clone(),
                    })
                })
        })
        .collect()
}

/// (block id, source URL) of file-like blocks held in secure storage
fn signable_files(record: &RawRecord) -> Vec<(String, String)> {
    record
        .block
        .values()
        .filter_map(|entry| entry.value.as_ref())
        .filter(|block| FILE_BLOCK_TYPES.contains(&block.block_type.as_str()))
        .filter_map(|block| {
            let source = block
                .properties
                .as_ref()?
                .get("source")?
                .get(0)?
                .get(0)?
                .as_str()?;
            SECURE_STORAGE_HOSTS
                .iter()
                .any(|host| source.contains(host))
                .then(|| (block.id.clone(), source.to_string()))
        })
        .collect()
}
