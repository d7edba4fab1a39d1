//! Configuration module
//!
//! Handles CLI configuration: the runner settings plus the workspace folders
//! the commands operate on.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use kaas_client::KaasClient;
use kaas_runner::discovery::resolve_folder;
use kaas_runner::state::JobStateStore;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Service, polling and state settings shared with the runner
    pub runner: kaas_runner::Config,

    /// Workspace folders; never empty
    pub workspaces: Vec<PathBuf>,
}

impl Config {
    /// Folders are made absolute so stored job ids match across invocations
    pub fn new(runner: kaas_runner::Config, workspaces: Vec<PathBuf>) -> Self {
        let workspaces = if workspaces.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            workspaces
        };
        let workspaces = workspaces.iter().map(|w| resolve_folder(w)).collect();
        Self { runner, workspaces }
    }

    /// Folder holding the git checkout and the state document
    pub fn workspace(&self) -> &Path {
        &self.workspaces[0]
    }

    /// Client for commands that talk to KaaS
    pub fn client(&self) -> Result<KaasClient> {
        self.runner
            .validate()
            .context("Invalid KaaS configuration")?;
        Ok(KaasClient::new(
            self.runner.base_url.clone(),
            self.runner.api_key.clone(),
        ))
    }

    /// Opens the job-id store of the workspace
    pub fn open_store(&self) -> Result<Arc<JobStateStore>> {
        let path = self.runner.state_path_for(self.workspace());
        let store = JobStateStore::open(&path)
            .with_context(|| format!("Failed to open state document {}", path.display()))?;
        Ok(Arc::new(store))
    }
}
