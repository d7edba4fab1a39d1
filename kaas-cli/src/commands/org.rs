//! Organization command handlers

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;

use crate::config::Config;

/// Organization subcommands
#[derive(Subcommand)]
pub enum OrgCommands {
    /// List organizations visible to the token
    List,
    /// List the vaults of an organization
    Vaults {
        /// Organization (GitHub owner)
        org: String,
    },
}

pub async fn handle_org_command(command: OrgCommands, config: &Config) -> Result<()> {
    let client = config.client()?;

    match command {
        OrgCommands::List => {
            let orgs = client
                .list_organizations()
                .await
                .context("Failed to list organizations")?;
            if orgs.is_empty() {
                println!("{}", "No organizations found.".yellow());
                println!(
                    "Install the GitHub app to grant access: {}",
                    config.runner.github_app_url
                );
            }
            for org in orgs {
                println!("  {} {}", "▸".cyan(), org.name);
            }
        }
        OrgCommands::Vaults { org } => {
            let vaults = client
                .list_vaults(&org)
                .await
                .with_context(|| format!("Failed to list vaults of {}", org))?;
            if vaults.is_empty() {
                println!("{}", format!("No vaults found for {}.", org).yellow());
            }
            for vault in vaults {
                println!("  {} {}", "▸".cyan(), vault.name);
            }
        }
    }

    Ok(())
}
