//! Status command handler

use anyhow::Result;

use dealbook_core::{Api, Backend, Config, JsonPersistence};

use crate::output::{Output, OutputFormat};

/// Show status information
pub fn show(api: &Api, token: Option<&str>, config: &Config, output: &Output) -> Result<()> {
    let counts = api.counts(token)?;
    let stats = match config.backend {
        Backend::File => Some(JsonPersistence::new(config.clone()).stats()),
        Backend::Memory => None,
    };

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "backend": config.backend.to_string(),
                    "note": super::backend_note(config.backend),
                    "data_dir": config.data_dir,
                    "access": if config.access.tokens.is_empty() { "local" } else { "token" },
                    "storage": stats.as_ref().map(|s| serde_json::json!({
                        "tables": s.tables.iter()
                            .map(|(name, size)| serde_json::json!({"table": name, "size": size}))
                            .collect::<Vec<_>>(),
                        "total_size": s.total_size()
                    })),
                    "counts": counts
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", counts.deals);
        }
        OutputFormat::Human => {
            println!("Dealbook Status");
            println!("===============");
            println!();
            println!("Storage:");
            println!("  Backend:  {}", config.backend);
            if let Some(note) = super::backend_note(config.backend) {
                println!("  Note:     {}", note);
            }
            if let Some(ref stats) = stats {
                println!("  Location: {}", config.data_dir.display());
                println!("  Size:     {}", stats.total_size_human());
            }
            println!();
            println!("Access:");
            if config.access.tokens.is_empty() {
                println!("  Local user trusted (no tokens configured)");
            } else {
                println!("  {} token(s) configured", config.access.tokens.len());
            }
            println!();
            println!("Contents:");
            println!("  Deals:    {}", counts.deals);
            println!("  Vendors:  {}", counts.vendors);
            println!("  Projects: {}", counts.projects);
            println!("  Tasks:    {}", counts.tasks);
        }
    }

    Ok(())
}
