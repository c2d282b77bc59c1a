//! Shared helpers for integration tests
//!
//! `Workspace` seeds an `InMemoryClient` with a content database and a
//! Name/Value config database, using real UUID page ids so id normalization
//! is exercised end to end.

#![allow(dead_code)]

use folio_core::config::ContentConfig;
use folio_core::models::{PageId, RawRecord};
use folio_core::remote::InMemoryClient;
use serde_json::{json, Value};

pub const CONTENT_DB: &str = "5f0c7b1e2d3a4c5b8e9f0a1b2c3d4e5f";
pub const CONFIG_DB: &str = "7a8b9c0d1e2f4a3b9c8d7e6f5a4b3c2d";

const CONTENT_COLLECTION: &str = "c0ffee00-0000-4000-8000-000000000001";
const CONFIG_COLLECTION: &str = "c0ffee00-0000-4000-8000-000000000002";
const VIEW: &str = "fee1dead-0000-4000-8000-000000000003";

/// Related collection and filtered view; both sort before the real ones
const RELATED_COLLECTION: &str = "0000aaaa-0000-4000-8000-000000000004";
const FILTERED_VIEW: &str = "0000bbbb-0000-4000-8000-000000000005";

/// Page id of the n-th seeded row, undashed like a share link
pub fn row_id(n: u32) -> String {
    format!("{:08x}00004000800000000000{:04x}", 0xabcd_0000u32 + n, n)
}

/// Content row in builder form
#[derive(Debug, Clone)]
pub struct Entry {
    pub title: String,
    pub slug: String,
    pub date: String,
    pub status: String,
    pub kind: String,
    pub tags: Vec<String>,
}

impl Entry {
    pub fn post(slug: &str, date: &str, status: &str) -> Self {
        Self {
            title: format!("Post {}", slug),
            slug: slug.to_string(),
            date: date.to_string(),
            status: status.to_string(),
            kind: "Post".to_string(),
            tags: Vec::new(),
        }
    }

    pub fn page(slug: &str, title: &str) -> Self {
        Self {
            title: title.to_string(),
            slug: slug.to_string(),
            date: "2024-01-01".to_string(),
            status: "Published".to_string(),
            kind: "Content".to_string(),
            tags: Vec::new(),
        }
    }

    pub fn with_kind(mut self, kind: &str) -> Self {
        self.kind = kind.to_string();
        self
    }

    pub fn with_status(mut self, status: &str) -> Self {
        self.status = status.to_string();
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }
}

/// Seeded remote store
#[derive(Debug, Default)]
pub struct Workspace {
    entries: Vec<Entry>,
    config_rows: Vec<(String, String, Option<String>)>,
    neighbours: bool,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(mut self, entry: Entry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn config_row(mut self, name: &str, value: &str, type_cell: Option<&str>) -> Self {
        self.config_rows
            .push((name.to_string(), value.to_string(), type_cell.map(str::to_string)));
        self
    }

    /// Add a related collection and a filtered second view to the content
    /// database record
    pub fn with_neighbours(mut self) -> Self {
        self.neighbours = true;
        self
    }

    /// Ids of the content rows, in database order
    pub fn entry_ids(&self) -> Vec<PageId> {
        (0..self.entries.len() as u32).map(|n| PageId::new(row_id(n))).collect()
    }

    pub fn client(&self) -> InMemoryClient {
        let entry_ids = self.entry_ids();
        let config_ids: Vec<PageId> = (0..self.config_rows.len() as u32)
            .map(|n| PageId::new(row_id(1000 + n)))
            .collect();

        let mut content_db = database(CONTENT_DB, CONTENT_COLLECTION, content_schema(), &entry_ids);
        if self.neighbours {
            add_neighbours(&mut content_db, &entry_ids);
        }

        let mut client = InMemoryClient::new()
            .with_record(CONTENT_DB, content_db)
            .with_record(
                CONFIG_DB,
                database(CONFIG_DB, CONFIG_COLLECTION, config_schema(), &config_ids),
            );

        for (id, entry) in entry_ids.iter().zip(&self.entries) {
            let properties = json!({
                "title": [[entry.title]],
                "slug": [[entry.slug]],
                "date": [["‣", [["d", { "type": "date", "start_date": entry.date }]]]],
                "stat": [[entry.status]],
                "kind": [[entry.kind]],
                "tags": [[entry.tags.join(",")]]
            });
            client = client.with_record(
                id.as_str(),
                row(id, CONTENT_COLLECTION, content_schema(), properties),
            );
        }

        for (id, (name, value, type_cell)) in config_ids.iter().zip(&self.config_rows) {
            let mut properties = json!({ "title": [[name]], "valu": [[value]] });
            if let Some(type_cell) = type_cell {
                properties["type"] = json!([[type_cell]]);
            }
            client = client.with_record(
                id.as_str(),
                row(id, CONFIG_COLLECTION, config_schema(), properties),
            );
        }

        client
    }
}

/// Configuration pointing at the seeded databases
pub fn config() -> ContentConfig {
    ContentConfig::from_lookup(|key| match key {
        "DATABASE_PAGE_ID" => Some(CONTENT_DB.to_string()),
        "CONFIG_PAGE_ID" => Some(CONFIG_DB.to_string()),
        _ => None,
    })
    .expect("test configuration is valid")
}

fn content_schema() -> Value {
    json!({
        "title": { "name": "Title", "type": "title" },
        "slug": { "name": "Slug", "type": "text" },
        "date": { "name": "Date", "type": "date" },
        "stat": { "name": "Status", "type": "status" },
        "kind": { "name": "Type", "type": "select" },
        "tags": { "name": "Tags", "type": "multi_select" }
    })
}

fn config_schema() -> Value {
    json!({
        "title": { "name": "Name", "type": "title" },
        "valu": { "name": "Value", "type": "text" },
        "type": { "name": "Type", "type": "select" }
    })
}

fn database(db: &str, collection: &str, schema: Value, rows: &[PageId]) -> RawRecord {
    let db_id = PageId::new(db);
    let rows: Vec<&str> = rows.iter().map(PageId::as_str).collect();
    serde_json::from_value(json!({
        "block": {
            db_id.as_str(): {
                "role": "reader",
                "value": {
                    "id": db_id.as_str(),
                    "type": "collection_view_page",
                    "collection_id": collection,
                    "view_ids": [VIEW]
                }
            }
        },
        "collection": {
            collection: { "role": "reader", "value": { "id": collection, "schema": schema } }
        },
        "collection_view": {
            VIEW: { "role": "reader", "value": { "id": VIEW, "type": "table" } }
        },
        "collection_query": {
            collection: { VIEW: { "blockIds": rows } }
        }
    }))
    .expect("database record is valid")
}

/// Second view showing only the last row, plus a collection from a relation
fn add_neighbours(record: &mut RawRecord, rows: &[PageId]) {
    let last: Vec<&str> = rows.iter().rev().take(1).map(PageId::as_str).collect();
    let neighbours: RawRecord = serde_json::from_value(json!({
        "collection": {
            RELATED_COLLECTION: { "role": "reader", "value": { "id": RELATED_COLLECTION } }
        },
        "collection_view": {
            FILTERED_VIEW: { "role": "reader", "value": { "id": FILTERED_VIEW, "type": "table" } }
        },
        "collection_query": {
            CONTENT_COLLECTION: { FILTERED_VIEW: { "blockIds": last } }
        }
    }))
    .expect("neighbour record is valid");
    record.merge(neighbours);

    let db_id = PageId::new(CONTENT_DB);
    if let Some(block) = record.block.get_mut(db_id.as_str()).and_then(|e| e.value.as_mut()) {
        block.view_ids = Some(vec![VIEW.to_string(), FILTERED_VIEW.to_string()]);
    }
}

fn row(id: &PageId, collection: &str, schema: Value, properties: Value) -> RawRecord {
    serde_json::from_value(json!({
        "block": {
            id.as_str(): {
                "role": "reader",
                "value": {
                    "id": id.as_str(),
                    "type": "page",
                    "parent_id": collection,
                    "parent_table": "collection",
                    "properties": properties,
                    "content": []
                }
            }
        },
        "collection": {
            collection: { "role": "reader", "value": { "id": collection, "schema": schema } }
        }
    }))
    .expect("row record is valid")
}
