//! Project command handlers

use anyhow::{bail, Context, Result};

use dealbook_core::{Api, NewProject, ProjectPatch, RecordId};

use crate::output::Output;
use crate::prompt::confirm;

pub fn create(
    api: &mut Api,
    token: Option<&str>,
    name: String,
    deal: Option<RecordId>,
    output: &Output,
) -> Result<()> {
    let project = api
        .create_project(token, NewProject { name, deal_id: deal })
        .context("Failed to create project")?;

    output.success(&format!("Created project: {}", project.id));
    output.print_project(&project);
    Ok(())
}

/// List projects, optionally only those on one deal
pub fn list(
    api: &Api,
    token: Option<&str>,
    deal: Option<RecordId>,
    output: &Output,
) -> Result<()> {
    let projects = api.list_projects(token, deal)?;
    output.print_projects(&projects);
    Ok(())
}

pub fn show(api: &Api, token: Option<&str>, id: RecordId, output: &Output) -> Result<()> {
    let project = api.get_project(token, id)?;
    output.print_project(&project);

    if !output.is_json() && !output.is_quiet() {
        let tasks = api.list_tasks(token, Some(project.id))?;
        if !tasks.is_empty() {
            println!();
            output.print_tasks(&tasks);
        }
    }
    Ok(())
}

pub fn edit(
    api: &mut Api,
    token: Option<&str>,
    id: RecordId,
    name: Option<String>,
    deal: Option<RecordId>,
    output: &Output,
) -> Result<()> {
    if name.is_none() && deal.is_none() {
        bail!("Nothing to change. Pass --name or --deal");
    }

    let project = api
        .update_project(token, id, ProjectPatch { name, deal_id: deal })
        .context("Failed to update project")?;

    output.success("Project updated");
    output.print_project(&project);
    Ok(())
}

pub fn delete(api: &mut Api, token: Option<&str>, id: RecordId, output: &Output) -> Result<()> {
    let project = api.get_project(token, id)?;

    if output.should_prompt() {
        println!("Delete project: #{} - {}", project.id, project.name);
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    api.delete_project(token, id)
        .context("Failed to delete project")?;

    output.success(&format!("Deleted project: {}", id));
    Ok(())
}
