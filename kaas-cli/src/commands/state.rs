//! State command handlers
//!
//! Lists and clears the job ids stored for the workspace.

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use colored::*;

use crate::config::Config;

/// State subcommands
#[derive(Subcommand)]
pub enum StateCommands {
    /// List stored job ids
    List,
    /// Forget stored job ids
    Clear {
        /// Identity as shown by `state list` (`<path>:<id>`)
        identity: Option<String>,

        /// Forget every stored job id
        #[arg(long, conflicts_with = "identity")]
        all: bool,
    },
}

pub fn handle_state_command(command: StateCommands, config: &Config) -> Result<()> {
    let store = config.open_store()?;

    match command {
        StateCommands::List => {
            let entries = store.entries();
            if entries.is_empty() {
                println!("{}", "No stored job ids.".yellow());
            }
            for (identity, job_id) in entries {
                println!("  {} {}", job_id.cyan(), identity);
            }
        }
        StateCommands::Clear { all: true, .. } => {
            let removed = store.clear_all().context("Failed to clear state")?;
            println!("Removed {} stored job id(s)", removed);
        }
        StateCommands::Clear {
            identity: Some(identity),
            ..
        } => match store.clear_key(&identity).context("Failed to clear state")? {
            Some(job_id) => println!("Removed job {} for {}", job_id, identity),
            None => println!("{}", format!("Nothing stored for {}", identity).yellow()),
        },
        StateCommands::Clear { identity: None, .. } => {
            bail!("Pass an identity or --all");
        }
    }

    Ok(())
}
