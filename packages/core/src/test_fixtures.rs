//! Record builders shared by unit tests
//!
//! Records are written as JSON in the same shape the remote store returns,
//! then decoded, so every test also exercises the serde model.

use crate::models::RawRecord;
use serde_json::{json, Value};

pub(crate) const CONTENT_COLLECTION_ID: &str = "coll-content";
pub(crate) const CONFIG_COLLECTION_ID: &str = "coll-config";
pub(crate) const VIEW_ID: &str = "view-1";

/// One row of the content database
#[derive(Debug, Clone)]
pub(crate) struct EntryRow<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub slug: &'a str,
    pub date: &'a str,
    pub status: Option<&'a str>,
    pub kind: &'a str,
    pub tags: &'a [&'a str],
}

impl<'a> EntryRow<'a> {
    pub fn post(id: &'a str, slug: &'a str, date: &'a str) -> Self {
        Self {
            id,
            title: slug,
            slug,
            date,
            status: Some("Published"),
            kind: "Post",
            tags: &[],
        }
    }

    pub fn page(id: &'a str, slug: &'a str, title: &'a str) -> Self {
        Self {
            id,
            title,
            slug,
            date: "2024-01-01",
            status: Some("Published"),
            kind: "Content",
            tags: &[],
        }
    }

    pub fn status(mut self, status: Option<&'a str>) -> Self {
        self.status = status;
        self
    }

    pub fn tags(mut self, tags: &'a [&'a str]) -> Self {
        self.tags = tags;
        self
    }

    pub fn kind(mut self, kind: &'a str) -> Self {
        self.kind = kind;
        self
    }
}

fn content_collection() -> Value {
    json!({
        "role": "reader",
        "value": {
            "id": CONTENT_COLLECTION_ID,
            "schema": {
                "title": { "name": "Title", "type": "title" },
                "s1ug": { "name": "Slug", "type": "text" },
                "d4te": { "name": "Date", "type": "date" },
                "st4t": { "name": "Status", "type": "select" },
                "typ3": { "name": "Type", "type": "select" },
                "t4gs": { "name": "Tags", "type": "multi_select" }
            }
        }
    })
}

fn config_collection() -> Value {
    json!({
        "role": "reader",
        "value": {
            "id": CONFIG_COLLECTION_ID,
            "schema": {
                "title": { "name": "Name", "type": "title" },
                "v4lu": { "name": "Value", "type": "text" },
                "typ3": { "name": "Type", "type": "select" }
            }
        }
    })
}

/// Database page whose single view lists `rows` in order
fn database(db_id: &str, collection_id: &str, collection: Value, rows: &[&str]) -> RawRecord {
    let mut record = json!({
        "block": {
            db_id: {
                "role": "reader",
                "value": {
                    "id": db_id,
                    "type": "collection_view_page",
                    "collection_id": collection_id,
                    "view_ids": [VIEW_ID]
                }
            }
        },
        "collection": { collection_id: collection },
        "collection_view": {
            VIEW_ID: { "role": "reader", "value": { "id": VIEW_ID, "type": "table" } }
        },
        "collection_query": {
            collection_id: {
                VIEW_ID: {
                    "collection_group_results": { "type": "results", "blockIds": rows, "hasMore": false }
                }
            }
        }
    });
    record["block"][db_id]["value"]["content"] = json!(rows);
    serde_json::from_value(record).unwrap()
}

fn row(id: &str, collection_id: &str, collection: Value, properties: Value) -> RawRecord {
    serde_json::from_value(json!({
        "block": {
            id: {
                "role": "reader",
                "value": {
                    "id": id,
                    "type": "page",
                    "parent_id": collection_id,
                    "parent_table": "collection",
                    "properties": properties
                }
            }
        },
        "collection": { collection_id: collection }
    }))
    .unwrap()
}

pub(crate) fn content_database(db_id: &str, rows: &[&str]) -> RawRecord {
    database(db_id, CONTENT_COLLECTION_ID, content_collection(), rows)
}

pub(crate) fn config_database(db_id: &str, rows: &[&str]) -> RawRecord {
    database(db_id, CONFIG_COLLECTION_ID, config_collection(), rows)
}

pub(crate) fn entry_record(entry: &EntryRow<'_>) -> RawRecord {
    let mut properties = json!({
        "title": [[entry.title]],
        "s1ug": [[entry.slug]],
        "d4te": [["‣", [["d", { "type": "date", "start_date": entry.date }]]]],
        "typ3": [[entry.kind]],
        "t4gs": [[entry.tags.join(",")]]
    });
    if let Some(status) = entry.status {
        properties["st4t"] = json!([[status]]);
    }
    row(entry.id, CONTENT_COLLECTION_ID, content_collection(), properties)
}

/// Config row; `name`/`value` of `None` leave the cell out entirely
pub(crate) fn config_row(
    id: &str,
    name: Option<&str>,
    value: Option<&str>,
    type_cell: Option<&str>,
) -> RawRecord {
    let mut properties = json!({});
    if let Some(name) = name {
        properties["title"] = json!([[name]]);
    }
    if let Some(value) = value {
        properties["v4lu"] = json!([[value]]);
    }
    if let Some(type_cell) = type_cell {
        properties["typ3"] = json!([[type_cell]]);
    }
    row(id, CONFIG_COLLECTION_ID, config_collection(), properties)
}

/// Row whose parent collection is not part of its record
pub(crate) fn orphan_row(id: &str) -> RawRecord {
    serde_json::from_value(json!({
        "block": {
            id: {
                "role": "reader",
                "value": {
                    "id": id,
                    "type": "page",
                    "parent_id": "coll-elsewhere",
                    "parent_table": "collection",
                    "properties": { "title": [["orphan"]] }
                }
            }
        }
    }))
    .unwrap()
}
