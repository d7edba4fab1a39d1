//! Error types for the runner

use std::path::PathBuf;

use kaas_client::ClientError;
use kaas_core::domain::job::JobStatus;
use thiserror::Error;

use crate::state::StateError;

/// Result type alias for runner operations
pub type Result<T> = std::result::Result<T, RunError>;

/// Errors surfaced while discovering, submitting or tracking jobs
#[derive(Debug, Error)]
pub enum RunError {
    /// Missing credentials, base URL or an invalid setting
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A profile config or test source could not be read; the folder is skipped
    #[error("Failed to discover tests in {path}: {message}")]
    Discovery { path: PathBuf, message: String },

    /// Transient transport failure, retried by the poller
    #[error("Network error: {0}")]
    Network(#[source] ClientError),

    /// The service rejected a request
    #[error("Remote job error: {0}")]
    RemoteJob(#[source] ClientError),

    /// The job finished with a failing status
    #[error("Job {job_id} finished with status {status}")]
    JobTerminalFailure { job_id: String, status: JobStatus },

    /// The job-id store could not be persisted
    #[error(transparent)]
    State(#[from] StateError),

    /// The git origin or branch could not be resolved
    #[error("Git error: {0}")]
    Git(String),
}

impl RunError {
    pub fn discovery(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Discovery {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl From<ClientError> for RunError {
    fn from(err: ClientError) -> Self {
        if err.is_transient() {
            Self::Network(err)
        } else {
            Self::RemoteJob(err)
        }
    }
}
