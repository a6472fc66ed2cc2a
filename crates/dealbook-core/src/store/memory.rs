//! In-memory record store

use chrono::Utc;
use tracing::{debug, info, warn};

use super::{RecordStore, StoreCounts};
use crate::config::Backend;
use crate::error::StoreResult;
use crate::models::{
    Deal, DealPatch, NewDeal, NewProject, NewTask, NewVendor, PositionUpdate, Project,
    ProjectPatch, RecordId, Task, TaskPatch, Vendor, VendorPatch,
};
use crate::table::Table;

/// Record store holding every table in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    deals: Table<Deal>,
    vendors: Table<Vendor>,
    projects: Table<Project>,
    tasks: Table<Task>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store around already loaded tables
    pub(crate) fn from_tables(
        deals: Table<Deal>,
        vendors: Table<Vendor>,
        projects: Table<Project>,
        tasks: Table<Task>,
    ) -> Self {
        Self {
            deals,
            vendors,
            projects,
            tasks,
        }
    }

    pub(crate) fn deals_mut(&mut self) -> &mut Table<Deal> {
        &mut self.deals
    }

    pub(crate) fn vendors_mut(&mut self) -> &mut Table<Vendor> {
        &mut self.vendors
    }

    pub(crate) fn projects_mut(&mut self) -> &mut Table<Project> {
        &mut self.projects
    }

    pub(crate) fn tasks_mut(&mut self) -> &mut Table<Task> {
        &mut self.tasks
    }

    /// Position a newly created deal receives
    fn next_position(&self) -> i64 {
        self.deals
            .iter()
            .map(|deal| deal.position)
            .max()
            .map_or(0, |max| max + 1)
    }
}

impl RecordStore for MemoryStore {
    fn backend(&self) -> Backend {
        Backend::Memory
    }

    fn create_deal(&mut self, new: NewDeal) -> StoreResult<Deal> {
        let position = self.next_position();
        let now = Utc::now();
        let deal = self
            .deals
            .insert_with(|id| Deal::new(id, new, position, now));
        info!("Created deal {} at position {}", deal.id, deal.position);
        Ok(deal)
    }

    fn get_deals(&self) -> StoreResult<Vec<Deal>> {
        let mut deals = self.deals.snapshot();
        deals.sort_by_key(|deal| (deal.position, deal.id));
        debug!("Listing {} deal(s)", deals.len());
        Ok(deals)
    }

    fn get_deal(&self, id: RecordId) -> StoreResult<Option<Deal>> {
        Ok(self.deals.get(id).cloned())
    }

    fn update_deal(&mut self, id: RecordId, patch: DealPatch) -> StoreResult<Deal> {
        let deal = self.deals.update(id, patch, Utc::now())?;
        info!("Updated deal {}", id);
        Ok(deal)
    }

    fn delete_deal(&mut self, id: RecordId) -> StoreResult<()> {
        self.deals.remove(id)?;
        info!("Deleted deal {}", id);
        Ok(())
    }

    fn reorder_deals(&mut self, updates: &[PositionUpdate]) -> StoreResult<usize> {
        let now = Utc::now();
        let mut applied = 0;
        for update in updates {
            match self.deals.get_mut(update.id) {
                Some(deal) => {
                    deal.set_position(update.position, now);
                    applied += 1;
                }
                None => warn!("Reorder skipped unknown deal {}", update.id),
            }
        }
        info!("Reordered {} of {} deal(s)", applied, updates.len());
        Ok(applied)
    }

    fn create_vendor(&mut self, new: NewVendor) -> StoreResult<Vendor> {
        let vendor = self.vendors.insert_with(|id| Vendor::new(id, new));
        info!("Created vendor {}", vendor.id);
        Ok(vendor)
    }

    fn get_vendors(&self) -> StoreResult<Vec<Vendor>> {
        Ok(self.vendors.snapshot())
    }

    fn get_vendor(&self, id: RecordId) -> StoreResult<Option<Vendor>> {
        Ok(self.vendors.get(id).cloned())
    }

    fn update_vendor(&mut self, id: RecordId, patch: VendorPatch) -> StoreResult<Vendor> {
        let vendor = self.vendors.update(id, patch, Utc::now())?;
        info!("Updated vendor {}", id);
        Ok(vendor)
    }

    fn delete_vendor(&mut self, id: RecordId) -> StoreResult<()> {
        self.vendors.remove(id)?;
        info!("Deleted vendor {}", id);
        Ok(())
    }

    fn create_project(&mut self, new: NewProject) -> StoreResult<Project> {
        let project = self.projects.insert_with(|id| Project::new(id, new));
        info!("Created project {}", project.id);
        Ok(project)
    }

    fn get_projects(&self, deal_id: Option<RecordId>) -> StoreResult<Vec<Project>> {
        Ok(self
            .projects
            .iter()
            .filter(|p| deal_id.is_none() || p.deal_id == deal_id)
            .cloned()
            .collect())
    }

    fn get_project(&self, id: RecordId) -> StoreResult<Option<Project>> {
        Ok(self.projects.get(id).cloned())
    }

    fn update_project(&mut self, id: RecordId, patch: ProjectPatch) -> StoreResult<Project> {
        let project = self.projects.update(id, patch, Utc::now())?;
        info!("Updated project {}", id);
        Ok(project)
    }

    fn delete_project(&mut self, id: RecordId) -> StoreResult<()> {
        self.projects.remove(id)?;
        info!("Deleted project {}", id);
        Ok(())
    }

    fn create_task(&mut self, new: NewTask) -> StoreResult<Task> {
        let task = self.tasks.insert_with(|id| Task::new(id, new));
        info!("Created task {}", task.id);
        Ok(task)
    }

    fn get_tasks(&self, project_id: Option<RecordId>) -> StoreResult<Vec<Task>> {
        Ok(self
            .tasks
            .iter()
            .filter(|t| project_id.is_none() || t.project_id == project_id)
            .cloned()
            .collect())
    }

    fn get_task(&self, id: RecordId) -> StoreResult<Option<Task>> {
        Ok(self.tasks.get(id).cloned())
    }

    fn update_task(&mut self, id: RecordId, patch: TaskPatch) -> StoreResult<Task> {
        let task = self.tasks.update(id, patch, Utc::now())?;
        info!("Updated task {}", id);
        Ok(task)
    }

    fn delete_task(&mut self, id: RecordId) -> StoreResult<()> {
        self.tasks.remove(id)?;
        info!("Deleted task {}", id);
        Ok(())
    }

    fn counts(&self) -> StoreCounts {
        StoreCounts {
            deals: self.deals.len(),
            vendors: self.vendors.len(),
            projects: self.projects.len(),
            tasks: self.tasks.len(),
        }
    }
}
