//! API token command handlers
//!
//! Only the SHA-256 hash of a token is written to the config file. The raw
//! token is printed once, when it is created.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use dealbook_core::access::{generate_token, hash_token, ApiToken};
use dealbook_core::Config;

use crate::output::{Output, OutputFormat};

/// Generate a token for `user` and store its hash
pub fn create(user: String, config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let user = user.trim().to_string();
    if user.is_empty() {
        bail!("User name must not be empty");
    }

    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    let token = generate_token();
    config.access.tokens.push(ApiToken {
        user: user.clone(),
        token_hash: hash_token(&token),
    });
    save(&config, config_path)?;

    match output.format {
        OutputFormat::Json => {
            println!("{}", serde_json::json!({"user": user, "token": token}));
        }
        OutputFormat::Quiet => println!("{}", token),
        OutputFormat::Human => {
            println!("✓ Created token for {}", user);
            println!();
            println!("  {}", token);
            println!();
            println!("Store it now; it cannot be shown again.");
            println!("Use it with --token or DEALBOOK_TOKEN.");
        }
    }

    Ok(())
}

/// List users holding a token
pub fn list(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    let users: Vec<&str> = config
        .access
        .tokens
        .iter()
        .map(|t| t.user.as_str())
        .collect();

    match output.format {
        OutputFormat::Json => println!("{}", serde_json::json!(users)),
        OutputFormat::Quiet => {
            for user in &users {
                println!("{}", user);
            }
        }
        OutputFormat::Human => {
            if users.is_empty() {
                println!("No tokens configured. The local user is trusted.");
                return Ok(());
            }
            for user in &users {
                println!("{}", user);
            }
            println!("\n{} token(s)", users.len());
        }
    }
    Ok(())
}

/// Remove every token held by `user`
pub fn revoke(user: String, config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    let before = config.access.tokens.len();
    config.access.tokens.retain(|t| t.user != user);
    let removed = before - config.access.tokens.len();
    if removed == 0 {
        bail!("No token found for user '{}'", user);
    }

    save(&config, config_path)?;
    output.success(&format!("Revoked {} token(s) for {}", removed, user));
    Ok(())
}

fn save(config: &Config, config_path: Option<&PathBuf>) -> Result<()> {
    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")
}
