//! Payload validation
//!
//! Every insert and patch passes through a `Validator` before it reaches the
//! store. Validation trims text fields, checks each field on its own and
//! reports every failing field at once.
//!
//! Patches are checked field by field: an absent field is always valid, a
//! present one must satisfy the same rule as on insert.

use std::collections::HashSet;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::models::{
    DealPatch, NewDeal, NewProject, NewTask, NewVendor, PositionUpdate, ProjectPatch, TaskPatch,
    VendorPatch,
};

/// Quarter labels offered when none are configured: Q1/2023 through Q4/2025
pub fn default_quarters() -> Vec<String> {
    (2023..=2025)
        .flat_map(|year| (1..=4).map(move |q| format!("Q{}/{}", q, year)))
        .collect()
}

/// A single rejected field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// All fields a payload was rejected for
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// A one-field failure
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// True if `field` is among the rejected fields
    pub fn has(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "Validation failed: {}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Decode a JSON request body, reporting decode failures as a `body` field error
pub fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T, ValidationErrors> {
    serde_json::from_str(body).map_err(|e| ValidationErrors::single("body", e.to_string()))
}

/// Checks payloads before they reach the store
#[derive(Debug, Clone)]
pub struct Validator {
    quarters: Vec<String>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(default_quarters())
    }
}

impl Validator {
    /// Create a validator accepting the given quarter labels
    pub fn new(quarters: Vec<String>) -> Self {
        Self { quarters }
    }

    pub fn quarters(&self) -> &[String] {
        &self.quarters
    }

    pub fn new_deal(&self, mut deal: NewDeal) -> Result<NewDeal, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        required_text(&mut errors, "accountName", &mut deal.account_name);
        required_text(&mut errors, "dealName", &mut deal.deal_name);
        required_text(&mut errors, "area", &mut deal.area);
        self.quarter(&mut errors, &mut deal.quarter);
        forecast(&mut errors, deal.forecast_amount);
        errors.into_result(deal)
    }

    pub fn deal_patch(&self, mut patch: DealPatch) -> Result<DealPatch, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(ref mut v) = patch.account_name {
            required_text(&mut errors, "accountName", v);
        }
        if let Some(ref mut v) = patch.deal_name {
            required_text(&mut errors, "dealName", v);
        }
        if let Some(ref mut v) = patch.area {
            required_text(&mut errors, "area", v);
        }
        if let Some(ref mut v) = patch.quarter {
            self.quarter(&mut errors, v);
        }
        forecast(&mut errors, patch.forecast_amount);
        errors.into_result(patch)
    }

    pub fn new_vendor(&self, mut vendor: NewVendor) -> Result<NewVendor, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        required_text(&mut errors, "name", &mut vendor.name);
        errors.into_result(vendor)
    }

    pub fn vendor_patch(&self, mut patch: VendorPatch) -> Result<VendorPatch, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(ref mut v) = patch.name {
            required_text(&mut errors, "name", v);
        }
        errors.into_result(patch)
    }

    pub fn new_project(&self, mut project: NewProject) -> Result<NewProject, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        required_text(&mut errors, "name", &mut project.name);
        errors.into_result(project)
    }

    pub fn project_patch(
        &self,
        mut patch: ProjectPatch,
    ) -> Result<ProjectPatch, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(ref mut v) = patch.name {
            required_text(&mut errors, "name", v);
        }
        errors.into_result(patch)
    }

    pub fn new_task(&self, mut task: NewTask) -> Result<NewTask, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        required_text(&mut errors, "title", &mut task.title);
        task.description = optional_text(task.description);
        errors.into_result(task)
    }

    pub fn task_patch(&self, mut patch: TaskPatch) -> Result<TaskPatch, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(ref mut v) = patch.title {
            required_text(&mut errors, "title", v);
        }
        patch.description = optional_text(patch.description);
        errors.into_result(patch)
    }

    /// A reorder batch may name each deal at most once
    pub fn positions(
        &self,
        updates: Vec<PositionUpdate>,
    ) -> Result<Vec<PositionUpdate>, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut seen = HashSet::new();
        for update in &updates {
            if !seen.insert(update.id) {
                errors.add("positions", format!("deal {} appears more than once", update.id));
            }
        }
        errors.into_result(updates)
    }

    /// A summary filter must name a configured quarter
    pub fn quarter_filter(&self, quarter: &str) -> Result<String, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut value = quarter.to_string();
        self.quarter(&mut errors, &mut value);
        errors.into_result(value)
    }

    fn quarter(&self, errors: &mut ValidationErrors, value: &mut String) {
        trim_in_place(value);
        if !self.quarters.iter().any(|q| q.as_str() == value.as_str()) {
            errors.add(
                "quarter",
                format!("'{}' is not one of the configured quarters", value),
            );
        }
    }
}

fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

fn required_text(errors: &mut ValidationErrors, field: &str, value: &mut String) {
    trim_in_place(value);
    if value.is_empty() {
        errors.add(field, "must not be empty");
    }
}

/// Blank optional text is treated as absent
fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn forecast(errors: &mut ValidationErrors, amount: Option<i64>) {
    if matches!(amount, Some(a) if a < 0) {
        errors.add("forecastAmount", "must not be negative");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DealStatus, Priority};

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
    fn test_default_quarters() {
        let quarters = default_quarters();
        assert_eq!(quarters.first().unwrap(), "Q1/2023");
        assert_eq!(quarters.last().unwrap(), "Q4/2025");
        assert_eq!(quarters.len(), 12);
    }

    #[test]
    fn test_valid_deal_passes_and_is_trimmed() {
        let validator = Validator::default();
        let mut deal = acme();
        deal.account_name = "  Acme  ".to_string();

        let deal = validator.new_deal(deal).unwrap();
        assert_eq!(deal.account_name, "Acme");
    }

    #[test]
    fn test_reports_every_failing_field() {
        let validator = Validator::default();
        let mut deal = acme();
        deal.account_name = "   ".to_string();
        deal.deal_name = String::new();
        deal.quarter = "Q5/2024".to_string();
        deal.forecast_amount = Some(-10);

        let errors = validator.new_deal(deal).unwrap_err();
        assert_eq!(errors.errors.len(), 4);
        assert!(errors.has("accountName"));
        assert!(errors.has("dealName"));
        assert!(errors.has("quarter"));
        assert!(errors.has("forecastAmount"));
        assert!(!errors.has("area"));
    }

    #[test]
    fn test_configured_quarters() {
        let validator = Validator::new(vec!["Q1/2030".to_string()]);
        let mut deal = acme();
        assert!(validator.new_deal(deal.clone()).is_err());

        deal.quarter = "Q1/2030".to_string();
        assert!(validator.new_deal(deal).is_ok());
    }

    #[test]
    fn test_patch_checks_only_present_fields() {
        let validator = Validator::default();

        let patch = DealPatch {
            status: Some(DealStatus::Done),
            ..Default::default()
        };
        assert!(validator.deal_patch(patch).is_ok());

        let patch = DealPatch {
            deal_name: Some(" ".to_string()),
            ..Default::default()
        };
        let errors = validator.deal_patch(patch).unwrap_err();
        assert!(errors.has("dealName"));
    }

    #[test]
    fn test_task_description_blank_is_absent() {
        let validator = Validator::default();
        let task = NewTask {
            title: "Kickoff".to_string(),
            description: Some("   ".to_string()),
            status: Default::default(),
            priority: Default::default(),
            due_date: None,
            project_id: None,
            assigned_to: None,
        };
        let task = validator.new_task(task).unwrap();
        assert!(task.description.is_none());
    }

    #[test]
    fn test_vendor_and_project_names_required() {
        let validator = Validator::default();
        assert!(validator
            .new_vendor(NewVendor {
                name: "".to_string(),
                user_id: None
            })
            .unwrap_err()
            .has("name"));
        assert!(validator
            .project_patch(ProjectPatch {
                name: Some(" ".to_string()),
                deal_id: None
            })
            .is_err());
    }

    #[test]
    fn test_positions_reject_duplicate_ids() {
        let validator = Validator::default();
        let ok = vec![
            PositionUpdate { id: 1, position: 1 },
            PositionUpdate { id: 2, position: 0 },
        ];
        assert!(validator.positions(ok).is_ok());

        let dup = vec![
            PositionUpdate { id: 1, position: 1 },
            PositionUpdate { id: 1, position: 0 },
        ];
        assert!(validator.positions(dup).unwrap_err().has("positions"));
    }

    #[test]
    fn test_quarter_filter() {
        let validator = Validator::default();
        assert_eq!(validator.quarter_filter(" Q2/2024 ").unwrap(), "Q2/2024");
        assert!(validator.quarter_filter("2024").is_err());
    }

    #[test]
    fn test_parse_json_reports_body() {
        let result: Result<NewDeal, _> = parse_json(r#"{"accountName": "Acme"}"#);
        let errors = result.unwrap_err();
        assert!(errors.has("body"));

        let result: Result<DealPatch, _> = parse_json(r#"{"status": "Won"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_display_lists_fields() {
        let mut errors = ValidationErrors::new();
        errors.add("quarter", "bad");
        errors.add("area", "must not be empty");
        assert_eq!(
            errors.to_string(),
            "Validation failed: quarter: bad; area: must not be empty"
        );
    }
}
