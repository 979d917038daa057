//! Recording persistence
//!
//! JSON document schema, merge-saving stores and path validation.

pub mod document;
pub mod path;
pub mod store;

pub use document::{KeyRecord, MouseRecord, RecordDocument};
pub use store::{JsonFileStore, MemoryStore, PersistenceAdapter};
