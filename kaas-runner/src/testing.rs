//! In-memory fakes shared by the unit tests of this crate

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use kaas_client::{ClientError, Result as ClientResult};
use kaas_core::domain::job::{JobKind, JobRecord, JobStatus};
use kaas_core::domain::org::{Organization, Vault};
use kaas_core::domain::test::TestCase;
use kaas_core::dto::job::{CreateJob, JobCreated};
use tokio_util::sync::CancellationToken;

use crate::git::{GitInfo, SourceControl};
use crate::reporter::ResultReporter;
use crate::repository::{JobRepository, VaultRepository};
use crate::{Result, RunError};

pub fn job(id: &str, status: JobStatus) -> JobRecord {
    JobRecord {
        id: id.to_string(),
        status,
        duration: 2.0,
        kind: JobKind::Kontrol,
        organization_name: "acme".to_string(),
        vault_name: "proofs".to_string(),
        cache_hash: None,
        profile_name: None,
        extra_prove_args: None,
        match_test: None,
        children: Vec::new(),
    }
}

/// One scripted answer to `get_job`
#[derive(Debug, Clone)]
pub enum Step {
    Job(JobRecord),
    Status(JobStatus),
    HttpError(u16),
    /// The request never completes
    Hang,
}

/// Scripted KaaS service
///
/// `get_job` pops steps per job id; the last step repeats forever.
#[derive(Default)]
pub struct FakeKaas {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    fetches: Mutex<HashMap<String, usize>>,
    created: Mutex<Vec<(String, String, CreateJob)>>,
    create_failures: Mutex<VecDeque<u16>>,
    next_id: Mutex<usize>,
    cancel_after_create: Mutex<Option<CancellationToken>>,
    pub token_valid: bool,
    pub organizations: Vec<String>,
    pub vaults: Mutex<Vec<String>>,
    pub link_fails: bool,
}

impl FakeKaas {
    pub fn new() -> Self {
        Self {
            organizations: vec!["acme".to_string()],
            vaults: Mutex::new(vec!["proofs".to_string()]),
            token_valid: true,
            ..Self::default()
        }
    }

    pub fn script(&self, job_id: &str, steps: Vec<Step>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(job_id.to_string(), steps.into());
    }

    pub fn fail_next_create(&self, status: u16) {
        self.create_failures.lock().unwrap().push_back(status);
    }

    /// Cancels `token` once the next job has been created
    pub fn cancel_after_create(&self, token: CancellationToken) {
        *self.cancel_after_create.lock().unwrap() = Some(token);
    }

    pub fn fetches(&self, job_id: &str) -> usize {
        self.fetches
            .lock()
            .unwrap()
            .get(job_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn created(&self) -> Vec<(String, String, CreateJob)> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobRepository for FakeKaas {
    async fn create_job(
        &self,
        organization: &str,
        vault: &str,
        req: &CreateJob,
    ) -> ClientResult<JobCreated> {
        if let Some(status) = self.create_failures.lock().unwrap().pop_front() {
            return Err(ClientError::api_error(status, "rejected"));
        }
        self.created.lock().unwrap().push((
            organization.to_string(),
            vault.to_string(),
            req.clone(),
        ));
        let job_id = {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            format!("job-{}", *next)
        };
        if let Some(token) = self.cancel_after_create.lock().unwrap().take() {
            token.cancel();
        }
        Ok(JobCreated { job_id })
    }

    async fn get_job(&self, job_id: &str) -> ClientResult<JobRecord> {
        *self
            .fetches
            .lock()
            .unwrap()
            .entry(job_id.to_string())
            .or_default() += 1;

        let step = {
            let mut scripts = self.scripts.lock().unwrap();
            let Some(queue) = scripts.get_mut(job_id) else {
                return Err(ClientError::api_error(404, "job not found"));
            };
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        };

        match step {
            Some(Step::Job(record)) => Ok(record),
            Some(Step::Status(status)) => Ok(job(job_id, status)),
            Some(Step::HttpError(status)) => Err(ClientError::api_error(status, "scripted")),
            Some(Step::Hang) => std::future::pending().await,
            None => Err(ClientError::api_error(404, "job not found")),
        }
    }

    fn job_url(&self, job: &JobRecord) -> String {
        format!("https://kaas.test/job/{}", job.id)
    }
}

#[async_trait]
impl VaultRepository for FakeKaas {
    async fn get_current_user(&self) -> ClientResult<serde_json::Value> {
        if self.token_valid {
            Ok(serde_json::json!({ "login": "kaas-user" }))
        } else {
            Err(ClientError::api_error(401, "invalid token"))
        }
    }

    async fn list_organizations(&self) -> ClientResult<Vec<Organization>> {
        Ok(self
            .organizations
            .iter()
            .map(|name| Organization {
                name: name.clone(),
                id: None,
            })
            .collect())
    }

    async fn get_vault(&self, organization: &str, vault: &str) -> ClientResult<Vault> {
        if self.vaults.lock().unwrap().iter().any(|v| v == vault) {
            Ok(Vault {
                name: vault.to_string(),
                organization_name: Some(organization.to_string()),
            })
        } else {
            Err(ClientError::api_error(404, "vault not found"))
        }
    }

    async fn link_vault(&self, organization: &str, vault: &str) -> ClientResult<Vault> {
        if self.link_fails {
            return Err(ClientError::api_error(403, "app not installed"));
        }
        self.vaults.lock().unwrap().push(vault.to_string());
        Ok(Vault {
            name: vault.to_string(),
            organization_name: Some(organization.to_string()),
        })
    }
}

/// Fixed git answers
pub struct FakeGit {
    pub repository: bool,
    pub info: Option<GitInfo>,
    pub upstream: bool,
    pub dirty: bool,
    pub unpushed: bool,
}

impl FakeGit {
    pub fn clean() -> Self {
        Self {
            repository: true,
            info: Some(GitInfo {
                owner: "acme".to_string(),
                repo: "proofs".to_string(),
                branch: "main".to_string(),
            }),
            upstream: true,
            dirty: false,
            unpushed: false,
        }
    }
}

#[async_trait]
impl SourceControl for FakeGit {
    async fn is_repository(&self, _workspace: &Path) -> bool {
        self.repository
    }

    async fn git_info(&self, _workspace: &Path) -> Result<GitInfo> {
        self.info
            .clone()
            .ok_or_else(|| RunError::Git("no remote named origin".to_string()))
    }

    async fn upstream_branch(&self, _workspace: &Path) -> Result<Option<String>> {
        Ok(self.upstream.then(|| "origin/main".to_string()))
    }

    async fn working_tree_changes(&self, _workspace: &Path) -> Result<bool> {
        Ok(self.dirty)
    }

    async fn unpushed_commits(&self, _workspace: &Path) -> Result<bool> {
        Ok(self.unpushed)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Enqueued(String),
    Started(String),
    Passed(String, Duration),
    Failed(String, String),
    Errored(String, String),
    Skipped(String),
    Output(Option<String>, String),
    End,
}

/// Reporter that records every event in order
#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<Event>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Terminal events only (passed, failed, errored, skipped)
    pub fn terminal(&self) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| {
                matches!(
                    e,
                    Event::Passed(..) | Event::Failed(..) | Event::Errored(..) | Event::Skipped(_)
                )
            })
            .collect()
    }

    pub fn ends(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Event::End))
            .count()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl ResultReporter for RecordingReporter {
    fn enqueued(&self, test: &TestCase) {
        self.push(Event::Enqueued(test.id().to_string()));
    }

    fn started(&self, test: &TestCase) {
        self.push(Event::Started(test.id().to_string()));
    }

    fn passed(&self, test: &TestCase, duration: Duration) {
        self.push(Event::Passed(test.id().to_string(), duration));
    }

    fn failed(&self, test: &TestCase, message: &str, _duration: Duration) {
        self.push(Event::Failed(test.id().to_string(), message.to_string()));
    }

    fn errored(&self, test: &TestCase, message: &str, _duration: Option<Duration>) {
        self.push(Event::Errored(test.id().to_string(), message.to_string()));
    }

    fn skipped(&self, test: &TestCase) {
        self.push(Event::Skipped(test.id().to_string()));
    }

    fn append_output(&self, test: Option<&TestCase>, output: &str) {
        self.push(Event::Output(
            test.map(|t| t.id().to_string()),
            output.to_string(),
        ));
    }

    fn end(&self) {
        self.push(Event::End);
    }
}
