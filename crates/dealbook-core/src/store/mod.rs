//! Record store
//!
//! `RecordStore` is the capability every backend provides: create, read-all,
//! read-one, update and delete for each entity type, plus bulk position
//! updates for deals.
//!
//! Two implementations are available, chosen when the store is opened:
//!
//! - `MemoryStore`: tables live for the lifetime of the process
//! - `FileStore`: the same tables, mirrored to one JSON file each
//!
//! ## Usage
//!
//! ```ignore
//! let mut store = store::open(&config)?;
//!
//! let deal = store.create_deal(new_deal)?;
//! store.update_deal(deal.id, DealPatch { status: Some(DealStatus::Done), ..Default::default() })?;
//!
//! let deals = store.get_deals()?; // ascending by position
//! ```

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use serde::Serialize;

use crate::config::{Backend, Config};
use crate::error::StoreResult;
use crate::models::{
    Deal, DealPatch, NewDeal, NewProject, NewTask, NewVendor, PositionUpdate, Project,
    ProjectPatch, RecordId, Task, TaskPatch, Vendor, VendorPatch,
};

/// Number of records per table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreCounts {
    pub deals: usize,
    pub vendors: usize,
    pub projects: usize,
    pub tasks: usize,
}

/// Keyed record collections, one per entity type
///
/// Reads return copies; nothing handed out aliases the store's own records.
/// `update_*` and `delete_*` fail with `StoreError::NotFound` when the id is
/// missing and leave the store unchanged.
pub trait RecordStore {
    /// Which backend this is
    fn backend(&self) -> Backend;

    // ==================== Deals ====================

    /// Insert a deal at the end of the ordering
    ///
    /// The new deal gets the next id and `position = max(position) + 1`,
    /// or `0` when there are no deals.
    fn create_deal(&mut self, new: NewDeal) -> StoreResult<Deal>;

    /// All deals, ascending by position (ties by id)
    fn get_deals(&self) -> StoreResult<Vec<Deal>>;

    /// A single deal; a missing id is `Ok(None)`
    fn get_deal(&self, id: RecordId) -> StoreResult<Option<Deal>>;

    /// Merge the present fields of `patch` and refresh `updated_at`
    fn update_deal(&mut self, id: RecordId, patch: DealPatch) -> StoreResult<Deal>;

    fn delete_deal(&mut self, id: RecordId) -> StoreResult<()>;

    /// Overwrite positions as given
    ///
    /// Unknown ids are skipped. Positions are taken verbatim; nothing here
    /// makes them contiguous or unique. Returns how many entries matched a
    /// deal.
    fn reorder_deals(&mut self, updates: &[PositionUpdate]) -> StoreResult<usize>;

    // ==================== Vendors ====================

    fn create_vendor(&mut self, new: NewVendor) -> StoreResult<Vendor>;
    fn get_vendors(&self) -> StoreResult<Vec<Vendor>>;
    fn get_vendor(&self, id: RecordId) -> StoreResult<Option<Vendor>>;
    fn update_vendor(&mut self, id: RecordId, patch: VendorPatch) -> StoreResult<Vendor>;
    fn delete_vendor(&mut self, id: RecordId) -> StoreResult<()>;

    // ==================== Projects ====================

    fn create_project(&mut self, new: NewProject) -> StoreResult<Project>;

    /// All projects, or only those attached to `deal_id`
    fn get_projects(&self, deal_id: Option<RecordId>) -> StoreResult<Vec<Project>>;
    fn get_project(&self, id: RecordId) -> StoreResult<Option<Project>>;
    fn update_project(&mut self, id: RecordId, patch: ProjectPatch) -> StoreResult<Project>;
    fn delete_project(&mut self, id: RecordId) -> StoreResult<()>;

    // ==================== Tasks ====================

    fn create_task(&mut self, new: NewTask) -> StoreResult<Task>;

    /// All tasks, or only those on `project_id`
    fn get_tasks(&self, project_id: Option<RecordId>) -> StoreResult<Vec<Task>>;
    fn get_task(&self, id: RecordId) -> StoreResult<Option<Task>>;
    fn update_task(&mut self, id: RecordId, patch: TaskPatch) -> StoreResult<Task>;
    fn delete_task(&mut self, id: RecordId) -> StoreResult<()>;

    // ==================== Stats ====================

    fn counts(&self) -> StoreCounts;
}

/// Open the backend selected by `config.backend`
pub fn open(config: &Config) -> StoreResult<Box<dyn RecordStore>> {
    match config.backend {
        Backend::Memory => Ok(Box::new(MemoryStore::new())),
        Backend::File => Ok(Box::new(FileStore::open(config.clone())?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_selects_backend() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config {
            data_dir: temp_dir.path().to_path_buf(),
            ..Config::default()
        };

        config.backend = Backend::Memory;
        assert_eq!(open(&config).unwrap().backend(), Backend::Memory);

        config.backend = Backend::File;
        assert_eq!(open(&config).unwrap().backend(), Backend::File);
    }
}
