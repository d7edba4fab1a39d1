//! Jobs repository
//!
//! Handles communication with KaaS for job-related operations:
//! - Submitting jobs
//! - Fetching job status
//! - Linking to a job in the KaaS app

use async_trait::async_trait;
use kaas_client::{KaasClient, Result};
use kaas_core::domain::job::JobRecord;
use kaas_core::dto::job::{CreateJob, JobCreated};

/// Repository trait for job-related operations with KaaS
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Submits a job for a vault
    ///
    /// # Arguments
    /// * `organization` - The organization owning the vault
    /// * `vault` - The vault to run against
    /// * `req` - The submission body
    async fn create_job(&self, organization: &str, vault: &str, req: &CreateJob)
    -> Result<JobCreated>;

    /// Fetches the current record of a job
    ///
    /// # Arguments
    /// * `job_id` - The ID of the job to fetch
    async fn get_job(&self, job_id: &str) -> Result<JobRecord>;

    /// Link to the job page, used in result messages
    fn job_url(&self, job: &JobRecord) -> String;
}

#[async_trait]
impl JobRepository for KaasClient {
    async fn create_job(
        &self,
        organization: &str,
        vault: &str,
        req: &CreateJob,
    ) -> Result<JobCreated> {
        KaasClient::create_job(self, organization, vault, req).await
    }

    async fn get_job(&self, job_id: &str) -> Result<JobRecord> {
        KaasClient::get_job(self, job_id).await
    }

    fn job_url(&self, job: &JobRecord) -> String {
        KaasClient::job_url(self, job)
    }
}
