//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod discover;
mod job;
mod org;
mod run;
mod state;
mod status;

pub use job::JobCommands;
pub use org::OrgCommands;
pub use state::StateCommands;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Show the discovered test tree and stored job ids
    Discover,
    /// Run tests on KaaS (all runnable tests when no id is given)
    Run {
        /// Test, profile or group ids
        ids: Vec<String>,

        /// Submit even with uncommitted or unpushed changes
        #[arg(long)]
        allow_dirty: bool,

        /// Submit all selected Kontrol profiles as a single job
        #[arg(long)]
        combine: bool,
    },
    /// Resume tracking jobs left running by a previous session
    Resume,
    /// Check that each workspace folder is synced with GitHub and KaaS
    Status,
    /// Job inspection
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },
    /// Organizations and vaults
    Org {
        #[command(subcommand)]
        command: OrgCommands,
    },
    /// Stored job ids
    State {
        #[command(subcommand)]
        command: StateCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Discover => discover::handle_discover_command(config),
        Commands::Run {
            ids,
            allow_dirty,
            combine,
        } => run::handle_run_command(ids, allow_dirty, combine, config).await,
        Commands::Resume => run::handle_resume_command(config).await,
        Commands::Status => status::handle_status_command(config).await,
        Commands::Job { command } => job::handle_job_command(command, config).await,
        Commands::Org { command } => org::handle_org_command(command, config).await,
        Commands::State { command } => state::handle_state_command(command, config),
    }
}
