//! Job domain types

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Remote verification job as reported by the KaaS service
///
/// A submission covering several proof profiles is reported as a parent
/// record whose `children` hold one record per profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub id: String,
    pub status: JobStatus,
    /// Elapsed run time in seconds
    #[serde(default)]
    pub duration: f64,
    pub kind: JobKind,
    pub organization_name: String,
    pub vault_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_name: Option<String>,
    /// Free-form arguments the profile was proven with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_prove_args: Option<String>,
    /// Structured test selector, when the service reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_test: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<JobRecord>,
}

impl JobRecord {
    /// Elapsed run time, clamped to zero for missing or negative values
    pub fn elapsed(&self) -> Duration {
        if self.duration.is_finite() && self.duration > 0.0 {
            Duration::from_secs_f64(self.duration)
        } else {
            Duration::ZERO
        }
    }

    /// Short form of the job id used in titles and log lines
    pub fn short_id(&self) -> &str {
        self.id.get(..6).unwrap_or(&self.id)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Job execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Success,
    Failure,
    ProcessingFailed,
    Cancelled,
}

impl JobStatus {
    /// Whether the job has finished and will never change status again
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Success
                | JobStatus::Failure
                | JobStatus::ProcessingFailed
                | JobStatus::Cancelled
        )
    }

    /// Statuses only move forward: pending, then running, then one terminal state.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        match (self, next) {
            (a, b) if a == b => true,
            (JobStatus::Pending, _) => true,
            (JobStatus::Running, JobStatus::Pending) => false,
            (JobStatus::Running, _) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Success => "success",
            JobStatus::Failure => "failure",
            JobStatus::ProcessingFailed => "processing_failed",
            JobStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

/// Proof tool a job runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Kontrol,
    Foundry,
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobKind::Kontrol => write!(f, "kontrol"),
            JobKind::Foundry => write!(f, "foundry"),
        }
    }
}
