//! Raw Record Maps
//!
//! A `RawRecord` is what the remote store returns for one page: every block
//! reachable from it plus, for databases, the collection schema, its views and
//! the materialized query results of those views.
//!
//! # Architecture
//!
//! - **Black box body**: the record is handed to the rendering layer as-is.
//!   Every struct keeps unknown fields in a flattened `extra` map so a record
//!   round-trips through serde (and the fixture cache) without loss.
//! - **Two traversals only**: reading a named property off one block
//!   (`property`) and listing the ordered child ids of the single
//!   collection view (`child_page_ids`).
//!
//! # Property encoding
//!
//! Block properties are keyed by schema property id, and each value is a
//! "decoration" array: `[[text, [[format, payload], ...]], ...]`. The text
//! content is the concatenation of the segment texts; dates live in a `"d"`
//! format payload.

use crate::models::{PageId, PropertyValue};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Record map for one page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub block: BTreeMap<String, RecordEntry<Block>>,

    #[serde(default)]
    pub collection: BTreeMap<String, RecordEntry<Collection>>,

    #[serde(default)]
    pub collection_view: BTreeMap<String, RecordEntry<CollectionView>>,

    /// collection id → view id → query result
    #[serde(default)]
    pub collection_query: BTreeMap<String, BTreeMap<String, CollectionQueryResult>>,

    /// block id → signed file URL
    #[serde(default)]
    pub signed_urls: BTreeMap<String, String>,

    /// Other tables (users, spaces, ...) kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One row of a record table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordEntry<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default)]
    pub value: Option<T>,
}

impl<T> RecordEntry<T> {
    /// Wrap a value with the default reader role
    pub fn new(value: T) -> Self {
        Self {
            role: Some("reader".to_string()),
            value: Some(value),
        }
    }
}

/// A block: page, database row, paragraph, image, ...
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: String,

    #[serde(rename = "type", default)]
    pub block_type: String,

    /// schema property id → decoration array
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_table: Option<String>,

    /// Ordered child block ids
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_ids: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_edited_time: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Block {
    /// Collection id of a database block
    ///
    /// Newer records move it into `format.collection_pointer.id`.
    pub fn database_collection_id(&self) -> Option<&str> {
        self.collection_id.as_deref().or_else(|| {
            self.format
                .as_ref()?
                .get("collection_pointer")?
                .get("id")?
                .as_str()
        })
    }

    /// Whether this block embeds a database
    pub fn is_database(&self) -> bool {
        matches!(
            self.block_type.as_str(),
            "collection_view" | "collection_view_page"
        )
    }
}

/// Database schema holder
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,

    /// property id → definition
    #[serde(default)]
    pub schema: BTreeMap<String, SchemaProperty>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_id: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Collection {
    /// Find a schema property id by display name (case-insensitive)
    pub fn property_id(&self, name: &str) -> Option<(&str, &SchemaProperty)> {
        let wanted = name.to_lowercase();
        self.schema
            .iter()
            .find(|(_, prop)| prop.name.to_lowercase() == wanted)
            .map(|(id, prop)| (id.as_str(), prop))
    }
}

/// Schema entry of a database property
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaProperty {
    #[serde(default)]
    pub name: String,

    #[serde(rename = "type", default)]
    pub property_type: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A view over a database
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionView {
    pub id: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub view_type: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Materialized result of one view's query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionQueryResult {
    /// Grouped result shape
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_group_results: Option<GroupResults>,

    /// Flat result shape
    #[serde(rename = "blockIds", default, skip_serializing_if = "Option::is_none")]
    pub block_ids: Option<Vec<String>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Grouped query results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupResults {
    #[serde(rename = "blockIds", default, skip_serializing_if = "Option::is_none")]
    pub block_ids: Option<Vec<String>>,

    #[serde(rename = "hasMore", default, skip_serializing_if = "Option::is_none")]
    pub has_more: Option<bool>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawRecord {
    /// Look up a block by id
    pub fn block(&self, id: &str) -> Option<&Block> {
        self.block.get(id)?.value.as_ref()
    }

    /// Look up a collection by id
    pub fn collection(&self, id: &str) -> Option<&Collection> {
        self.collection.get(id)?.value.as_ref()
    }

    /// Resolve a named property against a block
    ///
    /// The block's parent collection supplies the schema that maps the
    /// display name to a property id. Returns `Absent` when the block, its
    /// property bag, the collection or the schema entry is missing.
    pub fn property(&self, block_id: &str, name: &str) -> PropertyValue {
        let Some(block) = self.block(block_id) else {
            return PropertyValue::Absent;
        };
        let Some(properties) = block.properties.as_ref() else {
            return PropertyValue::Absent;
        };
        let Some(collection) = block.parent_id.as_deref().and_then(|id| self.collection(id)) else {
            return PropertyValue::Absent;
        };
        let Some((property_id, schema)) = collection.property_id(name) else {
            return PropertyValue::Absent;
        };

        decode_property(block, &schema.property_type, properties.get(property_id))
    }

    /// Ordered child page ids of a database page
    ///
    /// The collection and view come from the database block itself: its
    /// collection id and its first (default) view. Only when that block is
    /// missing from the record are the first collection and view entries
    /// used. Prefers the grouped result shape and falls back to the flat one.
    /// An empty database (no collection, view or query result) yields an
    /// empty list.
    pub fn child_page_ids(&self, database_id: &str) -> Vec<PageId> {
        let target = match self.block(database_id) {
            Some(block) => database_query_target(block),
            None => self.first_query_target(),
        };
        let Some((collection_id, view_id)) = target else {
            return Vec::new();
        };
        let Some(results) = self
            .collection_query
            .get(collection_id)
            .and_then(|views| views.get(view_id))
        else {
            return Vec::new();
        };

        let ids = match &results.collection_group_results {
            Some(group) => group.block_ids.as_deref(),
            None => results.block_ids.as_deref(),
        };

        ids.unwrap_or_default().iter().map(PageId::new).collect()
    }

    fn first_query_target(&self) -> Option<(&str, &str)> {
        let collection = self.collection.values().next()?.value.as_ref()?;
        let view = self.collection_view.values().next()?.value.as_ref()?;
        Some((collection.id.as_str(), view.id.as_str()))
    }

    /// Merge another record map into this one; entries from `other` win
    pub fn merge(&mut self, other: RawRecord) {
        self.block.extend(other.block);
        self.collection.extend(other.collection);
        self.collection_view.extend(other.collection_view);
        for (collection_id, views) in other.collection_query {
            self.collection_query
                .entry(collection_id)
                .or_default()
                .extend(views);
        }
        self.signed_urls.extend(other.signed_urls);
        self.extra.extend(other.extra);
    }
}

/// (collection id, default view id) named by a database block
fn database_query_target(block: &Block) -> Option<(&str, &str)> {
    let collection_id = block.database_collection_id()?;
    let view_id = block.view_ids.as_ref()?.first()?;
    Some((collection_id, view_id.as_str()))
}

/// Decode one property value according to its schema type
fn decode_property(block: &Block, property_type: &str, raw: Option<&Value>) -> PropertyValue {
    match property_type {
        "created_time" => block
            .created_time
            .map_or(PropertyValue::Absent, PropertyValue::Number),
        "last_edited_time" => block
            .last_edited_time
            .map_or(PropertyValue::Absent, PropertyValue::Number),
        "date" => raw
            .and_then(date_timestamp)
            .map_or(PropertyValue::Absent, PropertyValue::Number),
        "multi_select" => {
            let content = text_content(raw);
            if content.is_empty() {
                PropertyValue::StringList(Vec::new())
            } else {
                PropertyValue::StringList(content.split(',').map(str::to_string).collect())
            }
        }
        "number" => {
            let content = text_content(raw);
            match content.trim().parse::<f64>() {
                Ok(n) => PropertyValue::Number(n),
                Err(_) => PropertyValue::String(content),
            }
        }
        _ => PropertyValue::String(text_content(raw)),
    }
}

/// Concatenate the text of every decoration segment
fn text_content(raw: Option<&Value>) -> String {
    let Some(segments) = raw.and_then(Value::as_array) else {
        return String::new();
    };
    segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect()
}

/// Epoch milliseconds (UTC) of the start of a date decoration
fn date_timestamp(raw: &Value) -> Option<f64> {
    let payload = raw.as_array()?.iter().find_map(|segment| {
        segment
            .get(1)?
            .as_array()?
            .iter()
            .find(|format| format.get(0).and_then(Value::as_str) == Some("d"))?
            .get(1)
    })?;

    let date = NaiveDate::parse_from_str(payload.get("start_date")?.as_str()?, "%Y-%m-%d").ok()?;
    let is_datetime = matches!(
        payload.get("type").and_then(Value::as_str),
        Some("datetime" | "datetimerange")
    );
    let time = if is_datetime {
        payload
            .get("start_time")
            .and_then(Value::as_str)
            .and_then(|t| NaiveTime::parse_from_str(t, "%H:%M").ok())
            .unwrap_or(NaiveTime::MIN)
    } else {
        NaiveTime::MIN
    };

    Some(date.and_time(time).and_utc().timestamp_millis() as f64)
}
