//! Data models for Dealbook
//!
//! Defines the record types kept by the store: Deal, Vendor, Project and Task.
//! Each record type comes in three shapes:
//!
//! - the stored record (`Deal`), carrying store-generated fields
//! - the insert payload (`NewDeal`), everything a caller supplies on create
//! - the partial update (`DealPatch`), every field optional
//!
//! Field names serialize as camelCase, which is both the wire format and
//! the on-disk format of the JSON file backend.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Store-assigned record identifier
pub type RecordId = u64;

/// The kinds of record the store keeps, one id sequence each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Deal,
    Vendor,
    Project,
    Task,
}

impl EntityKind {
    /// Name of the backing table (and JSON file stem)
    pub fn table_name(&self) -> &'static str {
        match self {
            EntityKind::Deal => "deals",
            EntityKind::Vendor => "vendors",
            EntityKind::Project => "projects",
            EntityKind::Task => "tasks",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Deal => "Deal",
            EntityKind::Vendor => "Vendor",
            EntityKind::Project => "Project",
            EntityKind::Task => "Task",
        };
        write!(f, "{}", name)
    }
}

/// Error returned when a label does not name a known variant
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown {kind} '{value}'. Expected one of: {expected}")]
pub struct ParseLabelError {
    kind: &'static str,
    value: String,
    expected: String,
}

/// Lowercase and drop separators so "In Progress", "in-progress" and
/// "inprogress" all compare equal.
fn fold_label(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn parse_label<T: Copy>(
    kind: &'static str,
    value: &str,
    all: &[T],
    label: fn(&T) -> &'static str,
) -> Result<T, ParseLabelError> {
    let folded = fold_label(value);
    all.iter()
        .find(|v| fold_label(label(v)) == folded)
        .copied()
        .ok_or_else(|| ParseLabelError {
            kind,
            value: value.to_string(),
            expected: all.iter().map(label).collect::<Vec<_>>().join(", "),
        })
}

/// Deal pipeline status
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DealStatus {
    Done,
    Progress,
    Stuck,
}

impl DealStatus {
    pub const ALL: [DealStatus; 3] = [DealStatus::Done, DealStatus::Progress, DealStatus::Stuck];

    pub fn as_str(&self) -> &'static str {
        match self {
            DealStatus::Done => "Done",
            DealStatus::Progress => "Progress",
            DealStatus::Stuck => "Stuck",
        }
    }
}

impl fmt::Display for DealStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DealStatus {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_label("status", s, &Self::ALL, DealStatus::as_str)
    }
}

/// Priority shared by deals and tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_label("priority", s, &Self::ALL, Priority::as_str)
    }
}

/// Task board column
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "To Do")]
    ToDo,
    #[serde(rename = "In Progress")]
    InProgress,
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::ToDo, TaskStatus::InProgress, TaskStatus::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::ToDo => "To Do",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Done => "Done",
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::ToDo
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_label("task status", s, &Self::ALL, TaskStatus::as_str)
    }
}

// ==================== Deal ====================

/// A sales deal, the ordered entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    /// Store-assigned identifier
    pub id: RecordId,
    /// Customer account
    pub account_name: String,
    /// Name of the opportunity
    pub deal_name: String,
    /// Quarter label, e.g. "Q1/2024"
    pub quarter: String,
    pub status: DealStatus,
    pub priority: Priority,
    /// Geographic area
    pub area: String,
    /// Vendor this deal goes through (not enforced by the store)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<RecordId>,
    /// Expected value of the deal, in whole currency units
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast_amount: Option<i64>,
    /// Display order; lower comes first
    #[serde(default)]
    pub position: i64,
    /// When this deal was created
    pub created_at: DateTime<Utc>,
    /// When this deal was last changed
    pub updated_at: DateTime<Utc>,
}

impl Deal {
    /// Build a stored deal from a validated insert payload
    pub fn new(id: RecordId, new: NewDeal, position: i64, now: DateTime<Utc>) -> Self {
        Self {
            id,
            account_name: new.account_name,
            deal_name: new.deal_name,
            quarter: new.quarter,
            status: new.status,
            priority: new.priority,
            area: new.area,
            vendor_id: new.vendor_id,
            forecast_amount: new.forecast_amount,
            position,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge a partial update; absent fields keep their current value
    pub fn apply(&mut self, patch: DealPatch, now: DateTime<Utc>) {
        if let Some(account_name) = patch.account_name {
            self.account_name = account_name;
        }
        if let Some(deal_name) = patch.deal_name {
            self.deal_name = deal_name;
        }
        if let Some(quarter) = patch.quarter {
            self.quarter = quarter;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(area) = patch.area {
            self.area = area;
        }
        if let Some(vendor_id) = patch.vendor_id {
            self.vendor_id = Some(vendor_id);
        }
        if let Some(forecast_amount) = patch.forecast_amount {
            self.forecast_amount = Some(forecast_amount);
        }
        self.touch(now);
    }

    /// Move the position, refreshing the update time if it actually changed
    pub fn set_position(&mut self, position: i64, now: DateTime<Utc>) -> bool {
        if self.position == position {
            return false;
        }
        self.position = position;
        self.touch(now);
        true
    }

    /// Refresh `updated_at`; never moves it backwards
    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.updated_at);
    }
}

/// Insert payload for a deal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewDeal {
    pub account_name: String,
    pub deal_name: String,
    pub quarter: String,
    pub status: DealStatus,
    pub priority: Priority,
    pub area: String,
    #[serde(default)]
    pub vendor_id: Option<RecordId>,
    #[serde(default)]
    pub forecast_amount: Option<i64>,
}

/// Partial update for a deal
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct DealPatch {
    pub account_name: Option<String>,
    pub deal_name: Option<String>,
    pub quarter: Option<String>,
    pub status: Option<DealStatus>,
    pub priority: Option<Priority>,
    pub area: Option<String>,
    pub vendor_id: Option<RecordId>,
    pub forecast_amount: Option<i64>,
}

impl DealPatch {
    /// True if the patch would change nothing but `updated_at`
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One entry of a bulk reorder: put deal `id` at `position`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PositionUpdate {
    pub id: RecordId,
    pub position: i64,
}

// ==================== Vendor ====================

/// A vendor deals are sourced through
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    pub id: RecordId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<RecordId>,
}

impl Vendor {
    pub fn new(id: RecordId, new: NewVendor) -> Self {
        Self {
            id,
            name: new.name,
            user_id: new.user_id,
        }
    }

    pub fn apply(&mut self, patch: VendorPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(user_id) = patch.user_id {
            self.user_id = Some(user_id);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewVendor {
    pub name: String,
    #[serde(default)]
    pub user_id: Option<RecordId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct VendorPatch {
    pub name: Option<String>,
    pub user_id: Option<RecordId>,
}

// ==================== Project ====================

/// A delivery project attached to a deal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: RecordId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deal_id: Option<RecordId>,
}

impl Project {
    pub fn new(id: RecordId, new: NewProject) -> Self {
        Self {
            id,
            name: new.name,
            deal_id: new.deal_id,
        }
    }

    pub fn apply(&mut self, patch: ProjectPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(deal_id) = patch.deal_id {
            self.deal_id = Some(deal_id);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewProject {
    pub name: String,
    #[serde(default)]
    pub deal_id: Option<RecordId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub deal_id: Option<RecordId>,
}

// ==================== Task ====================

/// A unit of work on a project board
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: RecordId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<RecordId>,
}

impl Task {
    pub fn new(id: RecordId, new: NewTask) -> Self {
        Self {
            id,
            title: new.title,
            description: new.description,
            status: new.status,
            priority: new.priority,
            due_date: new.due_date,
            project_id: new.project_id,
            assigned_to: new.assigned_to,
        }
    }

    pub fn apply(&mut self, patch: TaskPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = Some(due_date);
        }
        if let Some(project_id) = patch.project_id {
            self.project_id = Some(project_id);
        }
        if let Some(assigned_to) = patch.assigned_to {
            self.assigned_to = Some(assigned_to);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub project_id: Option<RecordId>,
    #[serde(default)]
    pub assigned_to: Option<RecordId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub due_date: Option<DateTime<Utc>>,
    pub project_id: Option<RecordId>,
    pub assigned_to: Option<RecordId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

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
    fn test_deal_new() {
        let now = Utc::now();
        let deal = Deal::new(1, acme(), 0, now);
        assert_eq!(deal.id, 1);
        assert_eq!(deal.position, 0);
        assert_eq!(deal.created_at, now);
        assert_eq!(deal.updated_at, now);
    }

    #[test]
    fn test_deal_apply_keeps_absent_fields() {
        let now = Utc::now();
        let mut deal = Deal::new(1, acme(), 0, now);

        let later = now + Duration::seconds(5);
        deal.apply(
            DealPatch {
                status: Some(DealStatus::Done),
                ..Default::default()
            },
            later,
        );

        assert_eq!(deal.status, DealStatus::Done);
        assert_eq!(deal.account_name, "Acme");
        assert_eq!(deal.quarter, "Q1/2024");
        assert_eq!(deal.created_at, now);
        assert_eq!(deal.updated_at, later);
    }

    #[test]
    fn test_updated_at_never_goes_backwards() {
        let now = Utc::now();
        let mut deal = Deal::new(1, acme(), 0, now);

        deal.apply(DealPatch::default(), now - Duration::hours(1));
        assert_eq!(deal.updated_at, now);
    }

    #[test]
    fn test_set_position_only_touches_on_change() {
        let now = Utc::now();
        let mut deal = Deal::new(1, acme(), 3, now);
        let later = now + Duration::seconds(1);

        assert!(!deal.set_position(3, later));
        assert_eq!(deal.updated_at, now);

        assert!(deal.set_position(0, later));
        assert_eq!(deal.position, 0);
        assert_eq!(deal.updated_at, later);
    }

    #[test]
    fn test_deal_serializes_camel_case() {
        let deal = Deal::new(7, acme(), 2, Utc::now());
        let json = serde_json::to_value(&deal).unwrap();
        assert_eq!(json["accountName"], "Acme");
        assert_eq!(json["dealName"], "Renewal");
        assert_eq!(json["status"], "Progress");
        assert_eq!(json["position"], 2);
        assert!(json.get("createdAt").is_some());
        assert!(json.get("vendorId").is_none());
    }

    #[test]
    fn test_deal_without_position_loads_at_zero() {
        let json = r#"{
            "id": 4,
            "accountName": "Acme",
            "dealName": "Renewal",
            "quarter": "Q1/2024",
            "status": "Stuck",
            "priority": "High",
            "area": "Kon Tum",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        }"#;
        let deal: Deal = serde_json::from_str(json).unwrap();
        assert_eq!(deal.position, 0);
        assert_eq!(deal.status, DealStatus::Stuck);
    }

    #[test]
    fn test_patch_rejects_unknown_fields() {
        let result: Result<DealPatch, _> = serde_json::from_str(r#"{"id": 3}"#);
        assert!(result.is_err());

        let patch: DealPatch = serde_json::from_str(r#"{"status": "Done"}"#).unwrap();
        assert_eq!(patch.status, Some(DealStatus::Done));
        assert!(!patch.is_empty());
        assert!(DealPatch::default().is_empty());
    }

    #[test]
    fn test_task_status_labels() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"In Progress\""
        );
        let status: TaskStatus = serde_json::from_str("\"To Do\"").unwrap();
        assert_eq!(status, TaskStatus::ToDo);
    }

    #[test]
    fn test_parse_labels_loosely() {
        assert_eq!("progress".parse::<DealStatus>().unwrap(), DealStatus::Progress);
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!("in-progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert_eq!("todo".parse::<TaskStatus>().unwrap(), TaskStatus::ToDo);

        let err = "Won".parse::<DealStatus>().unwrap_err();
        assert!(err.to_string().contains("Done, Progress, Stuck"));
    }

    #[test]
    fn test_new_task_defaults() {
        let task: NewTask = serde_json::from_str(r#"{"title": "Kickoff"}"#).unwrap();
        assert_eq!(task.status, TaskStatus::ToDo);
        assert_eq!(task.priority, Priority::Medium);
    }

    #[test]
    fn test_vendor_apply() {
        let mut vendor = Vendor::new(
            1,
            NewVendor {
                name: "Contoso".to_string(),
                user_id: None,
            },
        );
        vendor.apply(VendorPatch {
            user_id: Some(9),
            ..Default::default()
        });
        assert_eq!(vendor.name, "Contoso");
        assert_eq!(vendor.user_id, Some(9));
    }

    #[test]
    fn test_entity_kind_names() {
        assert_eq!(EntityKind::Deal.table_name(), "deals");
        assert_eq!(EntityKind::Task.to_string(), "Task");
    }
}
