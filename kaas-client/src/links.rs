//! Web links into the KaaS app

use crate::KaasClient;
use kaas_core::domain::job::JobRecord;

impl KaasClient {
    /// Page showing a job in the KaaS app
    pub fn job_url(&self, job: &JobRecord) -> String {
        format!(
            "{}/app/organization/{}/{}/job/{}",
            self.base_url, job.organization_name, job.vault_name, job.id
        )
    }

    /// Page rendering a job's report
    pub fn job_report_url(&self, job: &JobRecord) -> String {
        format!("{}/report", self.job_url(job))
    }

    /// Page for the proof cache a job produced, if it has one
    pub fn job_cache_url(&self, job: &JobRecord) -> Option<String> {
        job.cache_hash.as_ref().map(|hash| {
            format!(
                "{}/app/organization/{}/{}/cache/{}",
                self.base_url, job.organization_name, job.vault_name, hash
            )
        })
    }
}
