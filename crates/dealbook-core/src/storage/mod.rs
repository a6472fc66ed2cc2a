//! Storage layer
//!
//! Reads and writes whole tables as JSON files.
//!
//! ## Layout
//!
//! One file per entity type inside the data directory:
//! `deals.json`, `vendors.json`, `projects.json`, `tasks.json`.
//! Each file is a pretty-printed JSON array of camelCase records and is
//! rewritten in full on every mutation.

pub mod error;
pub mod persistence;

pub use error::{StorageError, StorageResult};
pub use persistence::{JsonPersistence, StorageStats};
