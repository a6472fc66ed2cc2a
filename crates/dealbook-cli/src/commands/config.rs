//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use dealbook_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "backend": config.backend.to_string(),
                    "log_file": config.log_file,
                    "quarters": config.quarters,
                    "tokens": config.access.tokens.len()
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:  {}", config.data_dir.display());
            println!("  backend:   {}", config.backend);
            println!(
                "  log_file:  {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!("  quarters:  {}", config.quarters.join(", "));
            println!(
                "  tokens:    {}",
                if config.access.tokens.is_empty() {
                    "(none, local user trusted)".to_string()
                } else {
                    config.access.tokens.len().to_string()
                }
            );
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    apply(&mut config, &key, &value)?;

    // Save to the CLI-specified path or default
    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));
    if key == "backend" && !output.is_quiet() {
        if let Some(note) = super::backend_note(config.backend) {
            eprintln!("Note: {}", note);
        }
    }

    Ok(())
}

fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "data_dir" => {
            config.data_dir = value.into();
        }
        "backend" => {
            config.backend = value.parse()?;
        }
        "log_file" => {
            config.log_file = if value.is_empty() || value == "none" {
                None
            } else {
                Some(value.into())
            };
        }
        "quarters" => {
            let quarters: Vec<String> = value
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if quarters.is_empty() {
                bail!("At least one quarter is required, e.g. Q1/2026,Q2/2026");
            }
            config.quarters = quarters;
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: data_dir, backend, log_file, quarters",
                key
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dealbook_core::Backend;
    use tempfile::TempDir;

    #[test]
    fn test_apply_keys() {
        let mut config = Config::default();

        apply(&mut config, "backend", "memory").unwrap();
        assert_eq!(config.backend, Backend::Memory);

        apply(&mut config, "quarters", "Q1/2026, Q2/2026,").unwrap();
        assert_eq!(config.quarters, vec!["Q1/2026", "Q2/2026"]);

        apply(&mut config, "log_file", "/tmp/dealbook.log").unwrap();
        assert!(config.log_file.is_some());
        apply(&mut config, "log_file", "none").unwrap();
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_apply_rejects_bad_values() {
        let mut config = Config::default();
        assert!(apply(&mut config, "backend", "postgres").is_err());
        assert!(apply(&mut config, "quarters", " , ").is_err());
        assert!(apply(&mut config, "favorite", "x").is_err());
    }

    #[test]
    fn test_set_writes_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let data_dir = temp_dir.path().join("data");
        let output = Output::new(OutputFormat::Quiet);

        set(
            "data_dir".to_string(),
            data_dir.display().to_string(),
            Some(&config_path),
            &output,
        )
        .unwrap();

        let saved = std::fs::read_to_string(&config_path).unwrap();
        let config = Config::load_from_str(&saved).unwrap();
        assert_eq!(config.data_dir, data_dir);
    }

    #[test]
    fn test_set_backend_memory() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let output = Output::new(OutputFormat::Human);

        set(
            "backend".to_string(),
            "memory".to_string(),
            Some(&config_path),
            &output,
        )
        .unwrap();

        let saved = std::fs::read_to_string(&config_path).unwrap();
        assert!(saved.contains("backend = \"memory\""));
    }
}
