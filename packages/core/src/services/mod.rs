//! Content Services
//!
//! Services turn page accessors into what the rendering layer consumes:
//!
//! - `EntryReader` - validates one database row into a `ContentEntry`
//! - `ContentIndex` - memoized listings and slug lookups over the content database
//! - `ConfigResolver` - Name/Value database (or bundled default) into a `ConfigTree`

pub mod config_resolver;
pub mod content_index;
pub mod entry_reader;

pub use config_resolver::{bundled_config, ConfigResolver};
pub use content_index::{ContentIndex, IndexStatus, IndexedEntry};
pub use entry_reader::{EntryReader, EntrySchema};
