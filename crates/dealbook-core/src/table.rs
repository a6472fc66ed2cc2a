//! Keyed record collection
//!
//! A `Table` holds every record of one entity type together with that
//! type's id sequence. Ids start at 1 and only move forward: deleting the
//! newest record does not hand its id out again.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::error::{StoreError, StoreResult};
use crate::models::{
    Deal, DealPatch, EntityKind, Project, ProjectPatch, RecordId, Task, TaskPatch, Vendor,
    VendorPatch,
};

/// A record type the store can keep
pub trait Entity: Clone + Serialize + DeserializeOwned {
    /// Partial update shape for this record type
    type Patch;

    /// Which table the record lives in
    const KIND: EntityKind;

    fn id(&self) -> RecordId;

    /// Merge a partial update into the record
    fn apply_patch(&mut self, patch: Self::Patch, now: DateTime<Utc>);
}

impl Entity for Deal {
    type Patch = DealPatch;
    const KIND: EntityKind = EntityKind::Deal;

    fn id(&self) -> RecordId {
        self.id
    }

    fn apply_patch(&mut self, patch: DealPatch, now: DateTime<Utc>) {
        self.apply(patch, now);
    }
}

impl Entity for Vendor {
    type Patch = VendorPatch;
    const KIND: EntityKind = EntityKind::Vendor;

    fn id(&self) -> RecordId {
        self.id
    }

    fn apply_patch(&mut self, patch: VendorPatch, _now: DateTime<Utc>) {
        self.apply(patch);
    }
}

impl Entity for Project {
    type Patch = ProjectPatch;
    const KIND: EntityKind = EntityKind::Project;

    fn id(&self) -> RecordId {
        self.id
    }

    fn apply_patch(&mut self, patch: ProjectPatch, _now: DateTime<Utc>) {
        self.apply(patch);
    }
}

impl Entity for Task {
    type Patch = TaskPatch;
    const KIND: EntityKind = EntityKind::Task;

    fn id(&self) -> RecordId {
        self.id
    }

    fn apply_patch(&mut self, patch: TaskPatch, _now: DateTime<Utc>) {
        self.apply(patch);
    }
}

/// Two stored records claim the same id
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("id {0} appears more than once")]
pub struct DuplicateId(pub RecordId);

/// All records of one entity type, keyed by id
#[derive(Debug, Clone)]
pub struct Table<E: Entity> {
    records: BTreeMap<RecordId, E>,
    next_id: RecordId,
}

impl<E: Entity> Default for Table<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> Table<E> {
    /// Create an empty table; the first record gets id 1
    pub fn new() -> Self {
        Self {
            records: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Rebuild a table from previously stored records
    ///
    /// The id cursor resumes at `max(existing ids) + 1`. Records sharing an
    /// id are rejected rather than merged.
    pub fn from_records(records: Vec<E>) -> Result<Self, DuplicateId> {
        let mut by_id = BTreeMap::new();
        for record in records {
            let id = record.id();
            if by_id.insert(id, record).is_some() {
                return Err(DuplicateId(id));
            }
        }
        let next_id = by_id.keys().next_back().map_or(1, |max| max + 1);
        Ok(Self {
            records: by_id,
            next_id,
        })
    }

    /// The id the next inserted record will receive
    pub fn next_id(&self) -> RecordId {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Insert a record built from a freshly allocated id
    pub fn insert_with(&mut self, build: impl FnOnce(RecordId) -> E) -> E {
        let id = self.next_id;
        self.next_id += 1;
        let record = build(id);
        self.records.insert(id, record.clone());
        record
    }

    pub fn get(&self, id: RecordId) -> Option<&E> {
        self.records.get(&id)
    }

    pub fn get_mut(&mut self, id: RecordId) -> Option<&mut E> {
        self.records.get_mut(&id)
    }

    /// Iterate records in id order
    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.records.values()
    }

    /// Copy of every record, in id order
    pub fn snapshot(&self) -> Vec<E> {
        self.records.values().cloned().collect()
    }

    /// Merge a patch into an existing record and return the result
    pub fn update(&mut self, id: RecordId, patch: E::Patch, now: DateTime<Utc>) -> StoreResult<E> {
        let record = self
            .records
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found(E::KIND, id))?;
        record.apply_patch(patch, now);
        Ok(record.clone())
    }

    /// Hard-delete a record
    pub fn remove(&mut self, id: RecordId) -> StoreResult<E> {
        self.records
            .remove(&id)
            .ok_or_else(|| StoreError::not_found(E::KIND, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewVendor;

    fn vendor(name: &str) -> NewVendor {
        NewVendor {
            name: name.to_string(),
            user_id: None,
        }
    }

    #[test]
    fn test_ids_start_at_one_and_increase() {
        let mut table: Table<Vendor> = Table::new();
        let a = table.insert_with(|id| Vendor::new(id, vendor("a")));
        let b = table.insert_with(|id| Vendor::new(id, vendor("b")));
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let mut table: Table<Vendor> = Table::new();
        table.insert_with(|id| Vendor::new(id, vendor("a")));
        let b = table.insert_with(|id| Vendor::new(id, vendor("b")));

        table.remove(b.id).unwrap();
        let c = table.insert_with(|id| Vendor::new(id, vendor("c")));
        assert_eq!(c.id, 3);
    }

    #[test]
    fn test_from_records_resumes_cursor() {
        let records = vec![
            Vendor::new(4, vendor("a")),
            Vendor::new(9, vendor("b")),
            Vendor::new(2, vendor("c")),
        ];
        let table = Table::from_records(records).unwrap();
        assert_eq!(table.next_id(), 10);

        let empty: Table<Vendor> = Table::from_records(Vec::new()).unwrap();
        assert_eq!(empty.next_id(), 1);
    }

    #[test]
    fn test_from_records_rejects_shared_id() {
        let records = vec![
            Vendor::new(1, vendor("a")),
            Vendor::new(2, vendor("b")),
            Vendor::new(1, vendor("c")),
        ];
        let err = Table::from_records(records).unwrap_err();
        assert_eq!(err, DuplicateId(1));
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let mut table: Table<Vendor> = Table::new();
        let err = table
            .update(5, VendorPatch::default(), Utc::now())
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_remove_missing_is_not_found() {
        let mut table: Table<Vendor> = Table::new();
        table.insert_with(|id| Vendor::new(id, vendor("a")));

        assert!(table.remove(42).unwrap_err().is_not_found());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut table: Table<Vendor> = Table::new();
        table.insert_with(|id| Vendor::new(id, vendor("a")));

        let mut copy = table.snapshot();
        copy[0].name = "changed".to_string();

        assert_eq!(table.get(1).unwrap().name, "a");
    }
}
