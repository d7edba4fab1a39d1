//! Runner configuration
//!
//! Defines all configurable parameters for talking to KaaS including
//! the service URL, credentials, polling cadence and where job ids are persisted.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, RunError};

/// Public KaaS deployment
pub const DEFAULT_BASE_URL: &str = "https://kaas.runtimeverification.com";

/// GitHub app that grants KaaS access to a repository
pub const DEFAULT_GITHUB_APP_URL: &str = "https://github.com/apps/runtime-verification-inc";

/// Delay between two status requests for the same job
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

/// Location of the job-id document relative to the workspace root
pub const DEFAULT_STATE_FILE: &str = ".kaas/test-state.json";

/// Runner configuration
///
/// The poll interval is configurable to allow tuning for different
/// deployments (local service vs. the public one).
#[derive(Debug, Clone)]
pub struct Config {
    /// KaaS base URL (e.g., "https://kaas.runtimeverification.com")
    pub base_url: String,

    /// Personal access token sent as bearer auth
    pub api_key: String,

    /// How often to fetch the status of a running job
    pub poll_interval: Duration,

    /// Consecutive transient fetch failures tolerated before a test is errored;
    /// `None` retries forever
    pub max_transient_failures: Option<u32>,

    /// Explicit state document path; defaults to `<workspace>/.kaas/test-state.json`
    pub state_path: Option<PathBuf>,

    /// Where users install the GitHub app when their vault is missing
    pub github_app_url: String,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            base_url,
            api_key,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_transient_failures: None,
            state_path: None,
            github_app_url: DEFAULT_GITHUB_APP_URL.to_string(),
        }
    }

    /// Sets the poll interval
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Resolves the state document for a workspace
    pub fn state_path_for(&self, workspace: &Path) -> PathBuf {
        self.state_path
            .clone()
            .unwrap_or_else(|| workspace.join(DEFAULT_STATE_FILE))
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(RunError::Configuration(
                "api_key cannot be empty (set KAAS_API_KEY)".to_string(),
            ));
        }

        if self.base_url.is_empty() {
            return Err(RunError::Configuration(
                "base_url cannot be empty".to_string(),
            ));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(RunError::Configuration(
                "base_url must start with http:// or https://".to_string(),
            ));
        }

        if self.poll_interval.is_zero() {
            return Err(RunError::Configuration(
                "poll_interval must be greater than 0".to_string(),
            ));
        }

        if self.max_transient_failures == Some(0) {
            return Err(RunError::Configuration(
                "max_transient_failures must be greater than 0 when set".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL.to_string(), String::new())
    }
}
