//! Position reindexing
//!
//! Turns "move the item at index A to index B" within the visible ordered
//! list into a full `(id, position)` batch for `RecordStore::reorder_deals`.
//!
//! After a pass positions are `0..n`, contiguous and unique; the moved item
//! sits exactly at the destination index and every other item keeps its
//! order relative to the rest.

use thiserror::Error;

use crate::models::{PositionUpdate, RecordId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReindexError {
    #[error("Index {index} is out of range for a list of {len} item(s)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Id {0} is not in the list")]
    UnknownId(RecordId),
}

/// Assign `position = index` to every id, in the given order
pub fn reindex(ids: &[RecordId]) -> Vec<PositionUpdate> {
    ids.iter()
        .enumerate()
        .map(|(index, &id)| PositionUpdate {
            id,
            position: index as i64,
        })
        .collect()
}

/// Move the item at `from` to `to`, then reindex the whole list
pub fn move_item(
    ids: &[RecordId],
    from: usize,
    to: usize,
) -> Result<Vec<PositionUpdate>, ReindexError> {
    let len = ids.len();
    for index in [from, to] {
        if index >= len {
            return Err(ReindexError::IndexOutOfRange { index, len });
        }
    }

    let mut order = ids.to_vec();
    let moved = order.remove(from);
    order.insert(to, moved);
    Ok(reindex(&order))
}

/// Move the item with the given id to index `to`
pub fn move_id(
    ids: &[RecordId],
    id: RecordId,
    to: usize,
) -> Result<Vec<PositionUpdate>, ReindexError> {
    let from = ids
        .iter()
        .position(|&candidate| candidate == id)
        .ok_or(ReindexError::UnknownId(id))?;
    move_item(ids, from, to)
}
