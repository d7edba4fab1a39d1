//! Job-related API endpoints

use crate::KaasClient;
use crate::error::Result;
use kaas_core::domain::job::JobRecord;
use kaas_core::dto::job::{CreateJob, JobCreated};
use tracing::debug;

impl KaasClient {
    // =============================================================================
    // Job Lifecycle
    // =============================================================================

    /// Submit a new verification job for a vault
    ///
    /// # Arguments
    /// * `organization` - The organization owning the vault
    /// * `vault` - The vault (linked repository) to prove
    /// * `req` - The job creation request
    ///
    /// # Returns
    /// The id of the created job
    ///
    /// # Example
    /// ```no_run
    /// # use kaas_client::KaasClient;
    /// # use kaas_core::domain::job::JobKind;
    /// # use kaas_core::dto::job::{CreateJob, ProveProfile};
    /// # async fn example() -> anyhow::Result<()> {
    /// let client = KaasClient::new("https://kaas.runtimeverification.com", "token");
    /// let created = client.create_job("acme", "proofs", &CreateJob::new(
    ///     JobKind::Kontrol,
    ///     "main",
    ///     vec![ProveProfile::new("default", "")],
    ///     client.base_url(),
    /// )).await?;
    /// println!("Submitted {}", created.job_id);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create_job(
        &self,
        organization: &str,
        vault: &str,
        req: &CreateJob,
    ) -> Result<JobCreated> {
        debug!("Submitting {} job to {}/{}", req.kind, organization, vault);
        let response = self
            .post(&["api", "orgs", organization, "vaults", vault, "jobs"])?
            .json(req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get a job by ID
    ///
    /// # Arguments
    /// * `job_id` - The job id
    ///
    /// # Returns
    /// The job record, including child records for multi-profile jobs
    pub async fn get_job(&self, job_id: &str) -> Result<JobRecord> {
        let response = self.get(&["api", "jobs", job_id])?.send().await?;

        self.handle_response(response).await
    }

    /// Get the JSON report produced by a finished job
    ///
    /// # Arguments
    /// * `job_id` - The job id
    ///
    /// # Returns
    /// The report document as returned by the service
    pub async fn get_job_report(&self, job_id: &str) -> Result<serde_json::Value> {
        let response = self
            .get(&["api", "jobs", job_id, "json-report"])?
            .send()
            .await?;

        self.handle_response(response).await
    }
}
