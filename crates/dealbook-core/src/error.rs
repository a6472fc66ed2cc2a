//! Record store errors

use thiserror::Error;

use crate::models::{EntityKind, RecordId};
use crate::storage::StorageError;

/// Errors returned by `RecordStore` operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// The target record does not exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: RecordId },

    /// The backing files could not be read or written
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl StoreError {
    pub fn not_found(kind: EntityKind, id: RecordId) -> Self {
        StoreError::NotFound { kind, id }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
