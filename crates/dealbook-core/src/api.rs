//! Request facade
//!
//! `Api` is the single entry point for callers. Every operation runs the
//! same pipeline:
//!
//! 1. `AccessGate::identify` authenticates the presented token
//! 2. `Validator` checks and normalizes the payload
//! 3. the `RecordStore` applies the operation
//!
//! Failures at any step come back as an `ApiError`, which maps onto the
//! HTTP status a REST transport would answer with.

use thiserror::Error;
use tracing::{debug, info};

use crate::access::{gate_for, AccessError, AccessGate, Identity};
use crate::config::Config;
use crate::error::{StoreError, StoreResult};
use crate::models::{
    Deal, DealPatch, EntityKind, NewDeal, NewProject, NewTask, NewVendor, PositionUpdate,
    Project, ProjectPatch, RecordId, Task, TaskPatch, Vendor, VendorPatch,
};
use crate::reindex::{self, ReindexError};
use crate::storage::StorageError;
use crate::store::{self, RecordStore, StoreCounts};
use crate::summary::DealSummary;
use crate::validation::{ValidationErrors, Validator};

/// Why a request did not succeed
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Unauthenticated(#[from] AccessError),

    #[error(transparent)]
    ValidationFailed(#[from] ValidationErrors),

    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: RecordId },

    #[error("Storage failure: {0}")]
    Storage(#[source] StorageError),

    #[error("Invalid move: {0}")]
    InvalidMove(#[from] ReindexError),
}

impl ApiError {
    /// HTTP status code a REST transport answers with
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Unauthenticated(_) => 401,
            ApiError::ValidationFailed(_) => 400,
            ApiError::NotFound { .. } => 404,
            ApiError::Storage(_) => 500,
            ApiError::InvalidMove(_) => 400,
        }
    }

    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        let code = self.status_code();
        (400..500).contains(&code)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { kind, id } => ApiError::NotFound { kind, id },
            StoreError::Storage(e) => ApiError::Storage(e),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Authenticated, validated access to the record store
pub struct Api {
    store: Box<dyn RecordStore>,
    gate: Box<dyn AccessGate>,
    validator: Validator,
}

impl Api {
    pub fn new(store: Box<dyn RecordStore>, gate: Box<dyn AccessGate>, validator: Validator) -> Self {
        Self {
            store,
            gate,
            validator,
        }
    }

    /// Wire up the store, gate and validator described by `config`
    pub fn from_config(config: &Config) -> StoreResult<Self> {
        Ok(Self::new(
            store::open(config)?,
            gate_for(&config.access),
            Validator::new(config.quarters.clone()),
        ))
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Record counts, for callers that are allowed in
    pub fn counts(&self, token: Option<&str>) -> ApiResult<StoreCounts> {
        self.identify(token, "counts")?;
        Ok(self.store.counts())
    }

    fn identify(&self, token: Option<&str>, operation: &str) -> ApiResult<Identity> {
        let identity = self.gate.identify(token)?;
        debug!("{} requested {}", identity.user, operation);
        Ok(identity)
    }

    // ==================== Deals ====================

    /// All deals in display order
    pub fn list_deals(&self, token: Option<&str>) -> ApiResult<Vec<Deal>> {
        self.identify(token, "list_deals")?;
        Ok(self.store.get_deals()?)
    }

    pub fn get_deal(&self, token: Option<&str>, id: RecordId) -> ApiResult<Deal> {
        self.identify(token, "get_deal")?;
        self.store
            .get_deal(id)?
            .ok_or(ApiError::NotFound {
                kind: EntityKind::Deal,
                id,
            })
    }

    pub fn create_deal(&mut self, token: Option<&str>, new: NewDeal) -> ApiResult<Deal> {
        let identity = self.identify(token, "create_deal")?;
        let new = self.validator.new_deal(new)?;
        let deal = self.store.create_deal(new)?;
        info!("{} created deal {}", identity.user, deal.id);
        Ok(deal)
    }

    pub fn update_deal(
        &mut self,
        token: Option<&str>,
        id: RecordId,
        patch: DealPatch,
    ) -> ApiResult<Deal> {
        self.identify(token, "update_deal")?;
        let patch = self.validator.deal_patch(patch)?;
        Ok(self.store.update_deal(id, patch)?)
    }

    pub fn delete_deal(&mut self, token: Option<&str>, id: RecordId) -> ApiResult<()> {
        let identity = self.identify(token, "delete_deal")?;
        self.store.delete_deal(id)?;
        info!("{} deleted deal {}", identity.user, id);
        Ok(())
    }

    /// Apply a client-computed batch of positions
    pub fn reorder_deals(
        &mut self,
        token: Option<&str>,
        updates: Vec<PositionUpdate>,
    ) -> ApiResult<usize> {
        self.identify(token, "reorder_deals")?;
        let updates = self.validator.positions(updates)?;
        Ok(self.store.reorder_deals(&updates)?)
    }

    /// Move one deal to `to_index` in the current ordering
    ///
    /// Positions of every deal are rewritten to `0..n`. Returns the deals in
    /// their new order.
    pub fn move_deal(
        &mut self,
        token: Option<&str>,
        id: RecordId,
        to_index: usize,
    ) -> ApiResult<Vec<Deal>> {
        self.identify(token, "move_deal")?;
        let ids: Vec<RecordId> = self.store.get_deals()?.iter().map(|d| d.id).collect();

        let updates = match reindex::move_id(&ids, id, to_index) {
            Err(ReindexError::UnknownId(_)) => {
                return Err(ApiError::NotFound {
                    kind: EntityKind::Deal,
                    id,
                })
            }
            other => other?,
        };

        self.store.reorder_deals(&updates)?;
        info!("Moved deal {} to index {}", id, to_index);
        Ok(self.store.get_deals()?)
    }

    /// Pipeline totals, optionally for a single quarter
    pub fn deal_summary(
        &self,
        token: Option<&str>,
        quarter: Option<&str>,
    ) -> ApiResult<DealSummary> {
        self.identify(token, "deal_summary")?;
        let quarter = quarter
            .map(|q| self.validator.quarter_filter(q))
            .transpose()?;
        let deals = self.store.get_deals()?;
        Ok(DealSummary::from_deals(&deals, quarter.as_deref()))
    }

    // ==================== Vendors ====================

    pub fn list_vendors(&self, token: Option<&str>) -> ApiResult<Vec<Vendor>> {
        self.identify(token, "list_vendors")?;
        Ok(self.store.get_vendors()?)
    }

    pub fn get_vendor(&self, token: Option<&str>, id: RecordId) -> ApiResult<Vendor> {
        self.identify(token, "get_vendor")?;
        self.store.get_vendor(id)?.ok_or(ApiError::NotFound {
            kind: EntityKind::Vendor,
            id,
        })
    }

    pub fn create_vendor(&mut self, token: Option<&str>, new: NewVendor) -> ApiResult<Vendor> {
        self.identify(token, "create_vendor")?;
        let new = self.validator.new_vendor(new)?;
        Ok(self.store.create_vendor(new)?)
    }

    pub fn update_vendor(
        &mut self,
        token: Option<&str>,
        id: RecordId,
        patch: VendorPatch,
    ) -> ApiResult<Vendor> {
        self.identify(token, "update_vendor")?;
        let patch = self.validator.vendor_patch(patch)?;
        Ok(self.store.update_vendor(id, patch)?)
    }

    pub fn delete_vendor(&mut self, token: Option<&str>, id: RecordId) -> ApiResult<()> {
        self.identify(token, "delete_vendor")?;
        Ok(self.store.delete_vendor(id)?)
    }

    // ==================== Projects ====================

    pub fn list_projects(
        &self,
        token: Option<&str>,
        deal_id: Option<RecordId>,
    ) -> ApiResult<Vec<Project>> {
        self.identify(token, "list_projects")?;
        Ok(self.store.get_projects(deal_id)?)
    }

    pub fn get_project(&self, token: Option<&str>, id: RecordId) -> ApiResult<Project> {
        self.identify(token, "get_project")?;
        self.store.get_project(id)?.ok_or(ApiError::NotFound {
            kind: EntityKind::Project,
            id,
        })
    }

    pub fn create_project(&mut self, token: Option<&str>, new: NewProject) -> ApiResult<Project> {
        self.identify(token, "create_project")?;
        let new = self.validator.new_project(new)?;
        Ok(self.store.create_project(new)?)
    }

    pub fn update_project(
        &mut self,
        token: Option<&str>,
        id: RecordId,
        patch: ProjectPatch,
    ) -> ApiResult<Project> {
        self.identify(token, "update_project")?;
        let patch = self.validator.project_patch(patch)?;
        Ok(self.store.update_project(id, patch)?)
    }

    pub fn delete_project(&mut self, token: Option<&str>, id: RecordId) -> ApiResult<()> {
        self.identify(token, "delete_project")?;
        Ok(self.store.delete_project(id)?)
    }

    // ==================== Tasks ====================

    pub fn list_tasks(
        &self,
        token: Option<&str>,
        project_id: Option<RecordId>,
    ) -> ApiResult<Vec<Task>> {
        self.identify(token, "list_tasks")?;
        Ok(self.store.get_tasks(project_id)?)
    }

    pub fn get_task(&self, token: Option<&str>, id: RecordId) -> ApiResult<Task> {
        self.identify(token, "get_task")?;
        self.store.get_task(id)?.ok_or(ApiError::NotFound {
            kind: EntityKind::Task,
            id,
        })
    }

    pub fn create_task(&mut self, token: Option<&str>, new: NewTask) -> ApiResult<Task> {
        self.identify(token, "create_task")?;
        let new = self.validator.new_task(new)?;
        Ok(self.store.create_task(new)?)
    }

    pub fn update_task(
        &mut self,
        token: Option<&str>,
        id: RecordId,
        patch: TaskPatch,
    ) -> ApiResult<Task> {
        self.identify(token, "update_task")?;
        let patch = self.validator.task_patch(patch)?;
        Ok(self.store.update_task(id, patch)?)
    }

    pub fn delete_task(&mut self, token: Option<&str>, id: RecordId) -> ApiResult<()> {
        self.identify(token, "delete_task")?;
        Ok(self.store.delete_task(id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{hash_token, ApiToken, TokenGate};
    use crate::models::{DealStatus, Priority};
    use crate::store::MemoryStore;

    const TOKEN: Option<&str> = Some("letmein");

    fn api() -> Api {
        let gate = TokenGate::new(vec![ApiToken {
            user: "sales".to_string(),
            token_hash: hash_token("letmein"),
        }]);
        Api::new(
            Box::new(MemoryStore::new()),
            Box::new(gate),
            Validator::default(),
        )
    }

    fn acme() -> NewDeal {
        NewDeal {
            account_name: "Acme".to_string(),
            deal_name: "Renewal".to_string(),
            quarter: "Q1/2024".to_string(),
            status: DealStatus::Progress,
            priority: Priority::Medium,
            area: "Hà Nội".to_string(),
            vendor_id: None,
            forecast_amount: None,
        }
    }

    #[test]
    fn test_unauthenticated_requests_are_rejected() {
        let mut api = api();

        let err = api.list_deals(None).unwrap_err();
        assert_eq!(err.status_code(), 401);

        let err = api.create_deal(Some("wrong"), acme()).unwrap_err();
        assert_eq!(err.status_code(), 401);
        assert_eq!(api.store().counts().deals, 0);
    }

    #[test]
    fn test_validation_runs_before_store() {
        let mut api = api();
        let mut bad = acme();
        bad.quarter = "Q9/2024".to_string();
        bad.area = " ".to_string();

        let err = api.create_deal(TOKEN, bad).unwrap_err();
        assert_eq!(err.status_code(), 400);
        match err {
            ApiError::ValidationFailed(errors) => {
                assert!(errors.has("quarter"));
                assert!(errors.has("area"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(api.store().counts().deals, 0);
    }

    #[test]
    fn test_missing_records_are_404() {
        let mut api = api();
        assert_eq!(api.get_deal(TOKEN, 1).unwrap_err().status_code(), 404);
        assert_eq!(api.delete_deal(TOKEN, 1).unwrap_err().status_code(), 404);
        assert_eq!(
            api.update_task(TOKEN, 3, TaskPatch::default())
                .unwrap_err()
                .status_code(),
            404
        );
    }

    #[test]
    fn test_move_deal_rewrites_positions() {
        let mut api = api();
        for _ in 0..3 {
            api.create_deal(TOKEN, acme()).unwrap();
        }

        let deals = api.move_deal(TOKEN, 1, 2).unwrap();
        let order: Vec<_> = deals.iter().map(|d| (d.id, d.position)).collect();
        assert_eq!(order, vec![(2, 0), (3, 1), (1, 2)]);
    }

    #[test]
    fn test_move_deal_errors() {
        let mut api = api();
        api.create_deal(TOKEN, acme()).unwrap();

        assert_eq!(api.move_deal(TOKEN, 9, 0).unwrap_err().status_code(), 404);

        let err = api.move_deal(TOKEN, 1, 5).unwrap_err();
        assert!(matches!(err, ApiError::InvalidMove(_)));
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_reorder_rejects_duplicate_ids() {
        let mut api = api();
        api.create_deal(TOKEN, acme()).unwrap();

        let err = api
            .reorder_deals(
                TOKEN,
                vec![
                    PositionUpdate { id: 1, position: 4 },
                    PositionUpdate { id: 1, position: 5 },
                ],
            )
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(api.get_deal(TOKEN, 1).unwrap().position, 0);
    }

    #[test]
    fn test_deal_summary_checks_quarter() {
        let mut api = api();
        api.create_deal(TOKEN, acme()).unwrap();

        let summary = api.deal_summary(TOKEN, Some("Q1/2024")).unwrap();
        assert_eq!(summary.total, 1);
        assert_eq!(summary.by_status.progress, 1);

        let err = api.deal_summary(TOKEN, Some("someday")).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_project_and_task_flow() {
        let mut api = api();
        let deal = api.create_deal(TOKEN, acme()).unwrap();
        let project = api
            .create_project(
                TOKEN,
                NewProject {
                    name: " Rollout ".to_string(),
                    deal_id: Some(deal.id),
                },
            )
            .unwrap();
        assert_eq!(project.name, "Rollout");

        let task = api
            .create_task(
                TOKEN,
                NewTask {
                    title: "Kickoff".to_string(),
                    description: None,
                    status: Default::default(),
                    priority: Priority::High,
                    due_date: None,
                    project_id: Some(project.id),
                    assigned_to: None,
                },
            )
            .unwrap();

        let tasks = api.list_tasks(TOKEN, Some(project.id)).unwrap();
        assert_eq!(tasks, vec![task]);
        assert_eq!(api.list_projects(TOKEN, Some(deal.id)).unwrap().len(), 1);
    }

    #[test]
    fn test_error_classification() {
        let err = ApiError::Storage(StorageError::NotFound {
            path: "deals.json".into(),
        });
        assert_eq!(err.status_code(), 500);
        assert!(!err.is_client_error());
        assert!(ApiError::Unauthenticated(AccessError::MissingToken).is_client_error());
    }
}
