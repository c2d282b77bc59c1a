//! Data Models
//!
//! - `PageId` - Opaque, normalized page identifier
//! - `PropertyValue` - Tagged property shapes read off a block
//! - `RawRecord` - Record map returned by the remote store
//! - `ContentEntry` / `ContentPage` - Typed entries exposed to rendering
//! - `ConfigTree` - Nested site configuration

mod config_tree;
mod content_entry;
mod page_id;
mod property;
mod record;

pub use config_tree::{
    decode_json_or_string, split_key, ConfigNode, ConfigTree, InsertOutcome, SiteSettings,
    ValueDecoding, CONFIG_KEY_DELIMITER, JSON_TYPE_LITERAL,
};
pub use content_entry::{ContentEntry, ContentPage, EntryKind, EntryStatus};
pub use page_id::PageId;
pub use property::{PropertyKind, PropertyValue};
pub use record::{
    Block, Collection, CollectionQueryResult, CollectionView, GroupResults, RawRecord,
    RecordEntry, SchemaProperty,
};
