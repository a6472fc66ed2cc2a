//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use dealbook_core::{Deal, DealStatus, DealSummary, Priority, Project, Task, Vendor};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Print a single deal
    pub fn print_deal(&self, deal: &Deal) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:        {}", deal.id);
                println!("Account:   {}", deal.account_name);
                println!("Deal:      {}", deal.deal_name);
                println!("Quarter:   {}", deal.quarter);
                println!("Status:    {}", deal.status);
                println!("Priority:  {}", deal.priority);
                println!("Area:      {}", deal.area);
                if let Some(vendor_id) = deal.vendor_id {
                    println!("Vendor:    {}", vendor_id);
                }
                if let Some(amount) = deal.forecast_amount {
                    println!("Forecast:  {}", amount);
                }
                println!("Position:  {}", deal.position);
                println!("Created:   {}", deal.created_at.format("%Y-%m-%d %H:%M"));
                println!("Updated:   {}", deal.updated_at.format("%Y-%m-%d %H:%M"));
            }
            OutputFormat::Json => print_json(deal),
            OutputFormat::Quiet => println!("{}", deal.id),
        }
    }

    /// Print deals in display order
    pub fn print_deals(&self, deals: &[Deal]) {
        match self.format {
            OutputFormat::Human => {
                if deals.is_empty() {
                    println!("No deals found.");
                    return;
                }
                for deal in deals {
                    println!(
                        "{:>3} | #{:<4} | {} | {} | {} | {} | {} | {}",
                        deal.position,
                        deal.id,
                        truncate(&deal.account_name, 20),
                        truncate(&deal.deal_name, 30),
                        deal.quarter,
                        status_marker(deal.status),
                        priority_marker(deal.priority),
                        truncate(&deal.area, 15)
                    );
                }
                println!("\n{} deal(s)", deals.len());
            }
            OutputFormat::Json => print_json(deals),
            OutputFormat::Quiet => {
                for deal in deals {
                    println!("{}", deal.id);
                }
            }
        }
    }

    /// Print pipeline totals
    pub fn print_summary(&self, summary: &DealSummary) {
        match self.format {
            OutputFormat::Human => {
                match summary.quarter {
                    Some(ref quarter) => println!("Pipeline for {}", quarter),
                    None => println!("Pipeline (all quarters)"),
                }
                println!("=======================");
                println!();
                println!("Deals: {}", summary.total);
                for status in DealStatus::ALL {
                    println!("  {:<9} {}", status.as_str(), summary.by_status.get(status));
                }
                println!();
                println!("Priority:");
                for priority in Priority::ALL {
                    println!(
                        "  {:<9} {}",
                        priority.as_str(),
                        summary.by_priority.get(priority)
                    );
                }
                println!();
                println!("Forecast total: {}", summary.forecast_total);
                println!("Done:           {:.0}%", summary.done_percent());
            }
            OutputFormat::Json => print_json(summary),
            OutputFormat::Quiet => println!("{}", summary.total),
        }
    }

    pub fn print_vendor(&self, vendor: &Vendor) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:    {}", vendor.id);
                println!("Name:  {}", vendor.name);
                if let Some(user_id) = vendor.user_id {
                    println!("User:  {}", user_id);
                }
            }
            OutputFormat::Json => print_json(vendor),
            OutputFormat::Quiet => println!("{}", vendor.id),
        }
    }

    pub fn print_vendors(&self, vendors: &[Vendor]) {
        match self.format {
            OutputFormat::Human => {
                if vendors.is_empty() {
                    println!("No vendors found.");
                    return;
                }
                for vendor in vendors {
                    println!("#{:<4} | {}", vendor.id, truncate(&vendor.name, 50));
                }
                println!("\n{} vendor(s)", vendors.len());
            }
            OutputFormat::Json => print_json(vendors),
            OutputFormat::Quiet => {
                for vendor in vendors {
                    println!("{}", vendor.id);
                }
            }
        }
    }

    pub fn print_project(&self, project: &Project) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:    {}", project.id);
                println!("Name:  {}", project.name);
                if let Some(deal_id) = project.deal_id {
                    println!("Deal:  {}", deal_id);
                }
            }
            OutputFormat::Json => print_json(project),
            OutputFormat::Quiet => println!("{}", project.id),
        }
    }

    pub fn print_projects(&self, projects: &[Project]) {
        match self.format {
            OutputFormat::Human => {
                if projects.is_empty() {
                    println!("No projects found.");
                    return;
                }
                for project in projects {
                    let deal = project
                        .deal_id
                        .map(|id| format!("deal #{}", id))
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "#{:<4} | {} | {}",
                        project.id,
                        truncate(&project.name, 40),
                        deal
                    );
                }
                println!("\n{} project(s)", projects.len());
            }
            OutputFormat::Json => print_json(projects),
            OutputFormat::Quiet => {
                for project in projects {
                    println!("{}", project.id);
                }
            }
        }
    }

    pub fn print_task(&self, task: &Task) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:        {}", task.id);
                println!("Title:     {}", task.title);
                println!("Status:    {}", task.status);
                println!("Priority:  {}", task.priority);
                if let Some(ref description) = task.description {
                    println!("Details:   {}", description);
                }
                if let Some(due) = task.due_date {
                    println!("Due:       {}", due.format("%Y-%m-%d"));
                }
                if let Some(project_id) = task.project_id {
                    println!("Project:   {}", project_id);
                }
                if let Some(assignee) = task.assigned_to {
                    println!("Assignee:  {}", assignee);
                }
            }
            OutputFormat::Json => print_json(task),
            OutputFormat::Quiet => println!("{}", task.id),
        }
    }

    /// Print tasks grouped by board column
    pub fn print_tasks(&self, tasks: &[Task]) {
        match self.format {
            OutputFormat::Human => {
                if tasks.is_empty() {
                    println!("No tasks found.");
                    return;
                }
                for status in dealbook_core::TaskStatus::ALL {
                    let column: Vec<_> = tasks.iter().filter(|t| t.status == status).collect();
                    if column.is_empty() {
                        continue;
                    }
                    println!("── {} ({}) ──", status, column.len());
                    for task in column {
                        let due = task
                            .due_date
                            .map(|d| format!(" (due {})", d.format("%Y-%m-%d")))
                            .unwrap_or_default();
                        println!(
                            "#{:<4} {} {}{}",
                            task.id,
                            priority_marker(task.priority),
                            truncate(&task.title, 50),
                            due
                        );
                    }
                    println!();
                }
                println!("{} task(s)", tasks.len());
            }
            OutputFormat::Json => print_json(tasks),
            OutputFormat::Quiet => {
                for task in tasks {
                    println!("{}", task.id);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

/// Pretty-print any serializable value
pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to encode output as JSON: {}", e),
    }
}

fn status_marker(status: DealStatus) -> &'static str {
    match status {
        DealStatus::Done => "✔ Done    ",
        DealStatus::Progress => "… Progress",
        DealStatus::Stuck => "✖ Stuck   ",
    }
}

fn priority_marker(priority: Priority) -> &'static str {
    match priority {
        Priority::Low => "[low] ",
        Priority::Medium => "[med] ",
        Priority::High => "[HIGH]",
    }
}

/// Truncate a string to max length in characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
