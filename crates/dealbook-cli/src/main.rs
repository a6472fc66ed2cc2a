//! Dealbook CLI
//!
//! Command-line interface for Dealbook - sales pipeline tracking.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use dealbook_core::{
    Api, ApiError, Config, DealStatus, NewDeal, NewTask, Priority, RecordId, StorageError,
    StoreError, TaskStatus,
};

mod commands;
mod output;
mod prompt;

use commands::deal::DealFields;
use commands::task::{parse_due_date, TaskFields};
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "dealbook")]
#[command(about = "Dealbook - Sales pipeline tracking")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use this config file instead of the default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// API token (required when tokens are configured)
    #[arg(long, global = true, env = "DEALBOOK_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage deals
    Deal {
        #[command(subcommand)]
        command: DealCommands,
    },
    /// Manage vendors
    Vendor {
        #[command(subcommand)]
        command: VendorCommands,
    },
    /// Manage delivery projects
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },
    /// Manage project tasks
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Manage API tokens
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },
    /// Show status (storage, access, record counts)
    Status,
}

#[derive(Subcommand)]
enum DealCommands {
    /// Create a new deal
    #[command(alias = "add")]
    Create {
        /// Customer account name
        #[arg(short, long)]
        account: String,
        /// Deal name
        #[arg(short, long)]
        name: String,
        /// Quarter, e.g. Q1/2024
        #[arg(long)]
        quarter: String,
        /// Done, Progress or Stuck
        #[arg(short, long, default_value = "Progress")]
        status: DealStatus,
        /// Low, Medium or High
        #[arg(short, long, default_value = "Medium")]
        priority: Priority,
        /// Geographic area
        #[arg(long)]
        area: String,
        /// Vendor ID
        #[arg(long)]
        vendor: Option<RecordId>,
        /// Forecast amount
        #[arg(long)]
        forecast: Option<i64>,
    },
    /// List deals in display order
    #[command(alias = "ls")]
    List {
        /// Only deals in this quarter
        #[arg(long)]
        quarter: Option<String>,
        /// Only deals with this status
        #[arg(short, long)]
        status: Option<DealStatus>,
    },
    /// Show deal details
    Show {
        /// Deal ID
        id: RecordId,
    },
    /// Edit a deal
    Edit {
        /// Deal ID
        id: RecordId,
        #[arg(short, long)]
        account: Option<String>,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(long)]
        quarter: Option<String>,
        #[arg(short, long)]
        status: Option<DealStatus>,
        #[arg(short, long)]
        priority: Option<Priority>,
        #[arg(long)]
        area: Option<String>,
        #[arg(long)]
        vendor: Option<RecordId>,
        #[arg(long)]
        forecast: Option<i64>,
    },
    /// Delete a deal
    #[command(alias = "rm")]
    Delete {
        /// Deal ID
        id: RecordId,
    },
    /// Move a deal to a new place in the list
    Move {
        /// Deal ID
        id: RecordId,
        /// Target index (0 = top)
        to: usize,
    },
    /// Set positions from a JSON array of {"id", "position"} objects
    Reorder {
        /// e.g. '[{"id": 2, "position": 0}, {"id": 1, "position": 1}]'
        positions: String,
    },
    /// Show pipeline totals
    Summary {
        /// Only deals in this quarter
        #[arg(long)]
        quarter: Option<String>,
    },
}

#[derive(Subcommand)]
enum VendorCommands {
    /// Create a new vendor
    #[command(alias = "add")]
    Create {
        /// Vendor name
        name: String,
        /// Owning user ID
        #[arg(long)]
        user: Option<RecordId>,
    },
    /// List all vendors
    #[command(alias = "ls")]
    List,
    /// Show vendor details
    Show {
        /// Vendor ID
        id: RecordId,
    },
    /// Edit a vendor
    Edit {
        /// Vendor ID
        id: RecordId,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(long)]
        user: Option<RecordId>,
    },
    /// Delete a vendor
    #[command(alias = "rm")]
    Delete {
        /// Vendor ID
        id: RecordId,
    },
}

#[derive(Subcommand)]
enum ProjectCommands {
    /// Create a new project
    #[command(alias = "add")]
    Create {
        /// Project name
        name: String,
        /// Deal the project delivers
        #[arg(short, long)]
        deal: Option<RecordId>,
    },
    /// List projects
    #[command(alias = "ls")]
    List {
        /// Only projects on this deal
        #[arg(short, long)]
        deal: Option<RecordId>,
    },
    /// Show project details and its tasks
    Show {
        /// Project ID
        id: RecordId,
    },
    /// Edit a project
    Edit {
        /// Project ID
        id: RecordId,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        deal: Option<RecordId>,
    },
    /// Delete a project
    #[command(alias = "rm")]
    Delete {
        /// Project ID
        id: RecordId,
    },
}

#[derive(Subcommand)]
enum TaskCommands {
    /// Create a new task
    #[command(alias = "add")]
    Create {
        /// Task title
        title: String,
        /// Longer description
        #[arg(short, long)]
        description: Option<String>,
        /// "To Do", "In Progress" or Done
        #[arg(short, long, default_value = "To Do")]
        status: TaskStatus,
        /// Low, Medium or High
        #[arg(short, long, default_value = "Medium")]
        priority: Priority,
        /// Due date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_due_date)]
        due: Option<DateTime<Utc>>,
        /// Project ID
        #[arg(long)]
        project: Option<RecordId>,
        /// Assignee user ID
        #[arg(long)]
        assignee: Option<RecordId>,
    },
    /// List tasks by board column
    #[command(alias = "ls")]
    List {
        /// Only tasks on this project
        #[arg(long)]
        project: Option<RecordId>,
    },
    /// Show task details
    Show {
        /// Task ID
        id: RecordId,
    },
    /// Edit a task
    Edit {
        /// Task ID
        id: RecordId,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        status: Option<TaskStatus>,
        #[arg(short, long)]
        priority: Option<Priority>,
        #[arg(long, value_parser = parse_due_date)]
        due: Option<DateTime<Utc>>,
        #[arg(long)]
        project: Option<RecordId>,
        #[arg(long)]
        assignee: Option<RecordId>,
    },
    /// Delete a task
    #[command(alias = "rm")]
    Delete {
        /// Task ID
        id: RecordId,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, backend, log_file, quarters)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[derive(Subcommand, Clone)]
enum TokenCommands {
    /// Generate a token for a user and print it once
    Create {
        /// Who the token identifies
        user: String,
    },
    /// List users holding a token
    #[command(alias = "ls")]
    List,
    /// Remove a user's tokens
    Revoke {
        /// User whose tokens to remove
        user: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Commands that only touch the config file
    match &cli.command {
        Commands::Config { command } => {
            return handle_config_command(command.clone(), config_path, &output);
        }
        Commands::Token { command } => {
            return handle_token_command(command.clone(), config_path, &output);
        }
        _ => {}
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    init_logging(&config);

    let result = run(cli.command, &config, cli.token.as_deref(), &output);
    if let Err(ref e) = result {
        if let Some(hint) = storage_hint(e) {
            eprintln!("Hint: {}", hint);
        }
    }
    result
}

fn run(command: Commands, config: &Config, token: Option<&str>, output: &Output) -> Result<()> {
    let mut api = Api::from_config(config).context("Failed to open record store")?;

    match command {
        Commands::Deal { command } => handle_deal_command(command, &mut api, token, output),
        Commands::Vendor { command } => handle_vendor_command(command, &mut api, token, output),
        Commands::Project { command } => handle_project_command(command, &mut api, token, output),
        Commands::Task { command } => handle_task_command(command, &mut api, token, output),
        Commands::Status => commands::status::show(&api, token, config, output),
        Commands::Config { .. } | Commands::Token { .. } => Ok(()), // Handled in main
    }
}

/// Recovery advice for storage failures anywhere in the error chain
fn storage_hint(err: &anyhow::Error) -> Option<&'static str> {
    err.chain().find_map(|cause| {
        if let Some(ApiError::Storage(e)) = cause.downcast_ref::<ApiError>() {
            return e.recovery_suggestion();
        }
        if let Some(StoreError::Storage(e)) = cause.downcast_ref::<StoreError>() {
            return e.recovery_suggestion();
        }
        cause
            .downcast_ref::<StorageError>()
            .and_then(StorageError::recovery_suggestion)
    })
}

fn handle_deal_command(
    command: DealCommands,
    api: &mut Api,
    token: Option<&str>,
    output: &Output,
) -> Result<()> {
    match command {
        DealCommands::Create {
            account,
            name,
            quarter,
            status,
            priority,
            area,
            vendor,
            forecast,
        } => {
            let new = NewDeal {
                account_name: account,
                deal_name: name,
                quarter,
                status,
                priority,
                area,
                vendor_id: vendor,
                forecast_amount: forecast,
            };
            commands::deal::create(api, token, new, output)
        }
        DealCommands::List { quarter, status } => {
            commands::deal::list(api, token, quarter, status, output)
        }
        DealCommands::Show { id } => commands::deal::show(api, token, id, output),
        DealCommands::Edit {
            id,
            account,
            name,
            quarter,
            status,
            priority,
            area,
            vendor,
            forecast,
        } => {
            let fields = DealFields {
                account,
                name,
                quarter,
                status,
                priority,
                area,
                vendor,
                forecast,
            };
            commands::deal::edit(api, token, id, fields, output)
        }
        DealCommands::Delete { id } => commands::deal::delete(api, token, id, output),
        DealCommands::Move { id, to } => commands::deal::move_to(api, token, id, to, output),
        DealCommands::Reorder { positions } => {
            commands::deal::reorder(api, token, &positions, output)
        }
        DealCommands::Summary { quarter } => commands::deal::summary(api, token, quarter, output),
    }
}

fn handle_vendor_command(
    command: VendorCommands,
    api: &mut Api,
    token: Option<&str>,
    output: &Output,
) -> Result<()> {
    match command {
        VendorCommands::Create { name, user } => {
            commands::vendor::create(api, token, name, user, output)
        }
        VendorCommands::List => commands::vendor::list(api, token, output),
        VendorCommands::Show { id } => commands::vendor::show(api, token, id, output),
        VendorCommands::Edit { id, name, user } => {
            commands::vendor::edit(api, token, id, name, user, output)
        }
        VendorCommands::Delete { id } => commands::vendor::delete(api, token, id, output),
    }
}

fn handle_project_command(
    command: ProjectCommands,
    api: &mut Api,
    token: Option<&str>,
    output: &Output,
) -> Result<()> {
    match command {
        ProjectCommands::Create { name, deal } => {
            commands::project::create(api, token, name, deal, output)
        }
        ProjectCommands::List { deal } => commands::project::list(api, token, deal, output),
        ProjectCommands::Show { id } => commands::project::show(api, token, id, output),
        ProjectCommands::Edit { id, name, deal } => {
            commands::project::edit(api, token, id, name, deal, output)
        }
        ProjectCommands::Delete { id } => commands::project::delete(api, token, id, output),
    }
}

fn handle_task_command(
    command: TaskCommands,
    api: &mut Api,
    token: Option<&str>,
    output: &Output,
) -> Result<()> {
    match command {
        TaskCommands::Create {
            title,
            description,
            status,
            priority,
            due,
            project,
            assignee,
        } => {
            let new = NewTask {
                title,
                description,
                status,
                priority,
                due_date: due,
                project_id: project,
                assigned_to: assignee,
            };
            commands::task::create(api, token, new, output)
        }
        TaskCommands::List { project } => commands::task::list(api, token, project, output),
        TaskCommands::Show { id } => commands::task::show(api, token, id, output),
        TaskCommands::Edit {
            id,
            title,
            description,
            status,
            priority,
            due,
            project,
            assignee,
        } => {
            let fields = TaskFields {
                title,
                description,
                status,
                priority,
                due,
                project,
                assignee,
            };
            commands::task::edit(api, token, id, fields, output)
        }
        TaskCommands::Delete { id } => commands::task::delete(api, token, id, output),
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

fn handle_token_command(
    command: TokenCommands,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        TokenCommands::Create { user } => commands::token::create(user, config_path, output),
        TokenCommands::List => commands::token::list(config_path, output),
        TokenCommands::Revoke { user } => commands::token::revoke(user, config_path, output),
    }
}

/// Install a tracing subscriber when DEALBOOK_LOG is set
///
/// Logs go to `config.log_file` if set, otherwise stderr.
fn init_logging(config: &Config) {
    let Ok(log_level) = std::env::var("DEALBOOK_LOG") else {
        return;
    };

    let env_filter = EnvFilter::new(format!(
        "dealbook_core={},dealbook_cli={}",
        log_level, log_level
    ));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false);

    match config.log_file {
        Some(ref log_path) => match File::create(log_path) {
            Ok(log_file) => {
                let _ = builder
                    .with_ansi(false)
                    .with_writer(Mutex::new(log_file))
                    .try_init();
                info!("Logging initialized to {:?}", log_path);
            }
            Err(e) => {
                eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
                let _ = builder.with_writer(std::io::stderr).try_init();
            }
        },
        None => {
            let _ = builder.with_writer(std::io::stderr).try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_deal_create() {
        let cli = Cli::try_parse_from([
            "dealbook",
            "deal",
            "add",
            "--account",
            "Acme",
            "--name",
            "Renewal",
            "--quarter",
            "Q1/2024",
            "--area",
            "Hà Nội",
            "--status",
            "stuck",
        ])
        .unwrap();

        match cli.command {
            Commands::Deal {
                command:
                    DealCommands::Create {
                        account,
                        status,
                        priority,
                        ..
                    },
            } => {
                assert_eq!(account, "Acme");
                assert_eq!(status, DealStatus::Stuck);
                assert_eq!(priority, Priority::Medium);
            }
            _ => panic!("expected deal create"),
        }
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "dealbook",
            "deal",
            "move",
            "3",
            "0",
            "--json",
            "--token",
            "abc",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.token.as_deref(), Some("abc"));
        assert!(matches!(
            cli.command,
            Commands::Deal {
                command: DealCommands::Move { id: 3, to: 0 }
            }
        ));
    }

    #[test]
    fn test_parse_task_defaults_and_due() {
        let cli = Cli::try_parse_from([
            "dealbook", "task", "create", "Kickoff", "--due", "2024-05-01",
        ])
        .unwrap();
        match cli.command {
            Commands::Task {
                command: TaskCommands::Create { status, due, .. },
            } => {
                assert_eq!(status, TaskStatus::ToDo);
                assert!(due.is_some());
            }
            _ => panic!("expected task create"),
        }
    }

    #[test]
    fn test_storage_hint_found_through_context() {
        let err = ApiError::Storage(StorageError::DiskFull {
            path: PathBuf::from("/data/deals.json"),
            source: std::io::Error::new(std::io::ErrorKind::Other, "No space left on device"),
        });
        let err = anyhow::Error::new(err).context("Failed to create deal");
        assert_eq!(storage_hint(&err), Some("Free up disk space and try again."));

        let err = anyhow::anyhow!("Nothing to change");
        assert_eq!(storage_hint(&err), None);
    }

    #[test]
    fn test_rejects_unknown_status() {
        let result = Cli::try_parse_from(["dealbook", "deal", "list", "--status", "Won"]);
        assert!(result.is_err());
    }
}
