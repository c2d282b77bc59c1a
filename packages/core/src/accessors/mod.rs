//! Page and database accessors
//!
//! Accessors own the memoized fetch of one page and expose typed reads over
//! its record:
//!
//! - `PageAccessor`: typed property readers for a single page
//! - `CollectionAccessor`: ordered row ids of a database page

mod collection_accessor;
mod page_accessor;

pub use collection_accessor::CollectionAccessor;
pub use page_accessor::PageAccessor;
