//! Status command handler
//!
//! Shows, per workspace folder, whether it is ready to be proven on KaaS.

use anyhow::{Result, bail};
use colored::*;
use kaas_client::KaasClient;
use kaas_runner::git::GitCli;
use kaas_runner::service::{CheckState, WorkspaceStatus, workspace_status};

use crate::config::Config;

pub async fn handle_status_command(config: &Config) -> Result<()> {
    // An empty or rejected token is one of the checks, not a usage error
    let client = KaasClient::new(
        config.runner.base_url.clone(),
        config.runner.api_key.clone(),
    );
    let git = GitCli::new();

    let mut not_ready = 0;
    for folder in &config.workspaces {
        let status = workspace_status(&git, &client, folder).await;
        print_status(&status);
        if !status.is_ready() {
            not_ready += 1;
        }
    }

    if not_ready > 0 {
        bail!("{} workspace folder(s) not ready for KaaS", not_ready);
    }
    Ok(())
}

fn print_status(status: &WorkspaceStatus) {
    println!("{}", status.folder.display().to_string().bold());
    for item in &status.items {
        let icon = match item.state {
            CheckState::Passed => "✓".green(),
            CheckState::Warning => "!".yellow(),
            CheckState::Failed => "✗".red(),
        };
        println!("  {} {}", icon, item.message());
    }
}
