//! JSON file record store
//!
//! Every table is loaded into memory when the store is opened. Each mutation
//! is applied in memory first and then the affected table file is rewritten
//! in full. If that write fails, the in-memory table is put back the way it
//! was before the mutation, so memory and disk never disagree.

use tracing::{error, info};

use super::memory::MemoryStore;
use super::{RecordStore, StoreCounts};
use crate::config::{Backend, Config};
use crate::error::StoreResult;
use crate::models::{
    Deal, DealPatch, NewDeal, NewProject, NewTask, NewVendor, PositionUpdate, Project,
    ProjectPatch, RecordId, Task, TaskPatch, Vendor, VendorPatch,
};
use crate::storage::{JsonPersistence, StorageStats};
use crate::table::{Entity, Table};

/// Record store mirrored to one JSON file per table
pub struct FileStore {
    memory: MemoryStore,
    persistence: JsonPersistence,
}

impl FileStore {
    /// Open the store rooted at `config.data_dir`, loading every table
    pub fn open(config: Config) -> StoreResult<Self> {
        let persistence = JsonPersistence::new(config);
        persistence.ensure_data_dir()?;

        let memory = MemoryStore::from_tables(
            persistence.load_table()?,
            persistence.load_table()?,
            persistence.load_table()?,
            persistence.load_table()?,
        );

        info!(
            "Opened file store at {:?} ({} deal(s))",
            persistence.config().data_dir,
            memory.counts().deals
        );

        Ok(Self {
            memory,
            persistence,
        })
    }

    /// Sizes of the table files
    pub fn stats(&self) -> StorageStats {
        self.persistence.stats()
    }

    /// Run a mutation against one table and persist that table
    ///
    /// If `op` fails nothing has changed and nothing is written. If the
    /// write fails the table is restored to its state before `op`.
    fn commit<E, T>(
        &mut self,
        table: fn(&mut MemoryStore) -> &mut Table<E>,
        op: impl FnOnce(&mut MemoryStore) -> StoreResult<T>,
    ) -> StoreResult<T>
    where
        E: Entity,
    {
        let before = table(&mut self.memory).clone();
        let value = op(&mut self.memory)?;

        if let Err(e) = self.persistence.save_table(table(&mut self.memory)) {
            error!("Failed to persist {} table: {}", E::KIND.table_name(), e);
            *table(&mut self.memory) = before;
            return Err(e.into());
        }

        Ok(value)
    }
}

impl RecordStore for FileStore {
    fn backend(&self) -> Backend {
        Backend::File
    }

    fn create_deal(&mut self, new: NewDeal) -> StoreResult<Deal> {
        self.commit(MemoryStore::deals_mut, |m| m.create_deal(new))
    }

    fn get_deals(&self) -> StoreResult<Vec<Deal>> {
        self.memory.get_deals()
    }

    fn get_deal(&self, id: RecordId) -> StoreResult<Option<Deal>> {
        self.memory.get_deal(id)
    }

    fn update_deal(&mut self, id: RecordId, patch: DealPatch) -> StoreResult<Deal> {
        self.commit(MemoryStore::deals_mut, |m| m.update_deal(id, patch))
    }

    fn delete_deal(&mut self, id: RecordId) -> StoreResult<()> {
        self.commit(MemoryStore::deals_mut, |m| m.delete_deal(id))
    }

    fn reorder_deals(&mut self, updates: &[PositionUpdate]) -> StoreResult<usize> {
        self.commit(MemoryStore::deals_mut, |m| m.reorder_deals(updates))
    }

    fn create_vendor(&mut self, new: NewVendor) -> StoreResult<Vendor> {
        self.commit(MemoryStore::vendors_mut, |m| m.create_vendor(new))
    }

    fn get_vendors(&self) -> StoreResult<Vec<Vendor>> {
        self.memory.get_vendors()
    }

    fn get_vendor(&self, id: RecordId) -> StoreResult<Option<Vendor>> {
        self.memory.get_vendor(id)
    }

    fn update_vendor(&mut self, id: RecordId, patch: VendorPatch) -> StoreResult<Vendor> {
        self.commit(MemoryStore::vendors_mut, |m| m.update_vendor(id, patch))
    }

    fn delete_vendor(&mut self, id: RecordId) -> StoreResult<()> {
        self.commit(MemoryStore::vendors_mut, |m| m.delete_vendor(id))
    }

    fn create_project(&mut self, new: NewProject) -> StoreResult<Project> {
        self.commit(MemoryStore::projects_mut, |m| m.create_project(new))
    }

    fn get_projects(&self, deal_id: Option<RecordId>) -> StoreResult<Vec<Project>> {
        self.memory.get_projects(deal_id)
    }

    fn get_project(&self, id: RecordId) -> StoreResult<Option<Project>> {
        self.memory.get_project(id)
    }

    fn update_project(&mut self, id: RecordId, patch: ProjectPatch) -> StoreResult<Project> {
        self.commit(MemoryStore::projects_mut, |m| m.update_project(id, patch))
    }

    fn delete_project(&mut self, id: RecordId) -> StoreResult<()> {
        self.commit(MemoryStore::projects_mut, |m| m.delete_project(id))
    }

    fn create_task(&mut self, new: NewTask) -> StoreResult<Task> {
        self.commit(MemoryStore::tasks_mut, |m| m.create_task(new))
    }

    fn get_tasks(&self, project_id: Option<RecordId>) -> StoreResult<Vec<Task>> {
        self.memory.get_tasks(project_id)
    }

    fn get_task(&self, id: RecordId) -> StoreResult<Option<Task>> {
        self.memory.get_task(id)
    }

    fn update_task(&mut self, id: RecordId, patch: TaskPatch) -> StoreResult<Task> {
        self.commit(MemoryStore::tasks_mut, |m| m.update_task(id, patch))
    }

    fn delete_task(&mut self, id: RecordId) -> StoreResult<()> {
        self.commit(MemoryStore::tasks_mut, |m| m.delete_task(id))
    }

    fn counts(&self) -> StoreCounts {
        self.memory.counts()
    }
}
