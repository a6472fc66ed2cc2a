//! Dealbook Core Library
//!
//! This crate provides the core of Dealbook, a small sales pipeline tracker:
//! deals with a user-controlled display order, the vendors they go through,
//! and the delivery projects and tasks that follow a win.
//!
//! # Architecture
//!
//! Requests flow through three gates before they touch data:
//!
//! - **Access gate**: authenticates the caller's token
//! - **Validation gate**: checks and normalizes payloads
//! - **Record store**: keyed tables, in memory or mirrored to JSON files
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let mut api = Api::from_config(&config)?;
//!
//! let deal = api.create_deal(token, new_deal)?;
//! api.move_deal(token, deal.id, 0)?;
//!
//! let deals = api.list_deals(token)?;
//! ```
//!
//! # Modules
//!
//! - `api`: Request facade (main entry point)
//! - `store`: `RecordStore` trait and its memory and file backends
//! - `models`: Deals, vendors, projects and tasks
//! - `reindex`: Move-to-index position recomputation
//! - `validation`: Payload checks
//! - `access`: Token authentication
//! - `storage`: JSON table persistence
//! - `config`: Application configuration

pub mod access;
pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod reindex;
pub mod storage;
pub mod store;
pub mod summary;
pub mod table;
pub mod validation;

pub use access::{AccessError, AccessGate, Identity};
pub use api::{Api, ApiError, ApiResult};
pub use config::{Backend, Config};
pub use error::{StoreError, StoreResult};
pub use models::{
    Deal, DealPatch, DealStatus, NewDeal, NewProject, NewTask, NewVendor, PositionUpdate,
    Priority, Project, ProjectPatch, RecordId, Task, TaskPatch, TaskStatus, Vendor, VendorPatch,
};
pub use storage::{JsonPersistence, StorageError, StorageStats};
pub use store::{FileStore, MemoryStore, RecordStore, StoreCounts};
pub use summary::DealSummary;
pub use validation::{ValidationErrors, Validator};
