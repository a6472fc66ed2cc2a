//! Task command handlers

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};

use dealbook_core::{Api, NewTask, Priority, RecordId, TaskPatch, TaskStatus};

use crate::output::Output;
use crate::prompt::confirm;

/// Parse a due date given as `YYYY-MM-DD` or RFC 3339
pub fn parse_due_date(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| format!("Invalid date '{}'. Use YYYY-MM-DD", s))
}

/// Task fields given on the command line
pub struct TaskFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub due: Option<DateTime<Utc>>,
    pub project: Option<RecordId>,
    pub assignee: Option<RecordId>,
}

impl TaskFields {
    fn into_patch(self) -> TaskPatch {
        TaskPatch {
            title: self.title,
            description: self.description,
            status: self.status,
            priority: self.priority,
            due_date: self.due,
            project_id: self.project,
            assigned_to: self.assignee,
        }
    }
}

pub fn create(api: &mut Api, token: Option<&str>, new: NewTask, output: &Output) -> Result<()> {
    let task = api.create_task(token, new).context("Failed to create task")?;

    output.success(&format!("Created task: {}", task.id));
    output.print_task(&task);
    Ok(())
}

/// List tasks, optionally only those on one project
pub fn list(
    api: &Api,
    token: Option<&str>,
    project: Option<RecordId>,
    output: &Output,
) -> Result<()> {
    let tasks = api.list_tasks(token, project)?;
    output.print_tasks(&tasks);
    Ok(())
}

pub fn show(api: &Api, token: Option<&str>, id: RecordId, output: &Output) -> Result<()> {
    let task = api.get_task(token, id)?;
    output.print_task(&task);
    Ok(())
}

pub fn edit(
    api: &mut Api,
    token: Option<&str>,
    id: RecordId,
    fields: TaskFields,
    output: &Output,
) -> Result<()> {
    let patch = fields.into_patch();
    if patch == TaskPatch::default() {
        bail!("Nothing to change. Pass at least one field, e.g. --status done");
    }

    let task = api
        .update_task(token, id, patch)
        .context("Failed to update task")?;

    output.success("Task updated");
    output.print_task(&task);
    Ok(())
}

pub fn delete(api: &mut Api, token: Option<&str>, id: RecordId, output: &Output) -> Result<()> {
    let task = api.get_task(token, id)?;

    if output.should_prompt() {
        println!("Delete task: #{} - {}", task.id, task.title);
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    api.delete_task(token, id).context("Failed to delete task")?;

    output.success(&format!("Deleted task: {}", id));
    Ok(())
}
