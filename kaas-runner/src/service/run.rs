//! Test run service
//!
//! Submits one aggregate run: a batch of leaf tests is validated once, each
//! submission is sent to KaaS, its job id is persisted, and a poller task is
//! spawned per job. The run ends exactly once, when every submitted test
//! reached a terminal state.

use std::path::Path;
use std::sync::Arc;

use kaas_core::domain::job::JobKind;
use kaas_core::domain::test::{KontrolRun, RunKind, TestCase};
use kaas_core::dto::job::CreateJob;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::Result;
use crate::git::{GitInfo, SourceControl};
use crate::reporter::{ResultReporter, TestOutcome};
use crate::repository::KaasApi;
use crate::scheduler::{JobPoller, PollState, PollTarget, RunningSet};
use crate::service::validation::validate_workspace;
use crate::state::JobStateStore;

/// Options of a single run
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Submit even with uncommitted or unpushed changes
    pub allow_dirty: bool,
    /// Send all selected Kontrol profiles as one job with one child per profile
    pub combine_kontrol: bool,
}

/// Outcome counts of a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub skipped: usize,
}

impl RunSummary {
    pub fn record(&mut self, outcome: TestOutcome) {
        match outcome {
            TestOutcome::Passed => self.passed += 1,
            TestOutcome::Failed => self.failed += 1,
            TestOutcome::Errored => self.errored += 1,
            TestOutcome::Skipped => self.skipped += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.errored + self.skipped
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.errored == 0
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} passed, {} failed, {} errored, {} skipped",
            self.passed, self.failed, self.errored, self.skipped
        )
    }
}

impl From<PollState> for TestOutcome {
    fn from(state: PollState) -> Self {
        match state {
            PollState::Passed => TestOutcome::Passed,
            PollState::Failed => TestOutcome::Failed,
            PollState::Submitted | PollState::Polling | PollState::Errored => TestOutcome::Errored,
        }
    }
}

/// An aggregate run whose pollers may still be running
pub struct RunHandle {
    pub run_id: Uuid,
    summary: RunSummary,
    pollers: Vec<JoinHandle<Vec<TestOutcome>>>,
}

impl RunHandle {
    pub(super) fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            summary: RunSummary::default(),
            pollers: Vec::new(),
        }
    }

    pub(super) fn push_poller(&mut self, poller: JoinHandle<Vec<TestOutcome>>) {
        self.pollers.push(poller);
    }

    /// Number of jobs still being polled when the handle was created
    pub fn pending_jobs(&self) -> usize {
        self.pollers.len()
    }

    /// Waits for every poller and returns the final counts
    pub async fn wait(self) -> RunSummary {
        let mut summary = self.summary;
        for poller in self.pollers {
            match poller.await {
                Ok(outcomes) => outcomes.into_iter().for_each(|o| summary.record(o)),
                Err(e) => error!("Poller task of run {} failed: {}", self.run_id, e),
            }
        }
        info!("Run {} finished: {}", self.run_id, summary);
        summary
    }
}

/// One job submission and the tests it reports on
#[derive(Debug)]
struct Submission {
    kind: JobKind,
    targets: Vec<PollTarget>,
}

/// Orchestrates submission and polling of test batches
pub struct TestRunService<A: KaasApi + 'static> {
    pub(super) api: Arc<A>,
    git: Arc<dyn SourceControl>,
    pub(super) store: Arc<JobStateStore>,
    pub(super) config: Config,
}

impl<A: KaasApi + 'static> TestRunService<A> {
    pub fn new(
        api: Arc<A>,
        git: Arc<dyn SourceControl>,
        store: Arc<JobStateStore>,
        config: Config,
    ) -> Self {
        Self {
            api,
            git,
            store,
            config,
        }
    }

    pub fn store(&self) -> &JobStateStore {
        &self.store
    }

    /// Submits `tests` and spawns their pollers
    ///
    /// Returns once every test is submitted, skipped or errored. Results keep
    /// flowing into `reporter` until [`RunHandle::wait`] resolves.
    pub async fn run_tests(
        &self,
        workspace: &Path,
        tests: Vec<TestCase>,
        reporter: Arc<dyn ResultReporter>,
        cancel: CancellationToken,
        options: RunOptions,
    ) -> RunHandle {
        let mut handle = RunHandle::new();
        let running = Arc::new(RunningSet::new());
        info!("Starting run {} with {} test(s)", handle.run_id, tests.len());

        if !tests.is_empty() {
            match validate_workspace(
                &*self.git,
                &*self.api,
                workspace,
                options.allow_dirty,
                &self.config.github_app_url,
            )
            .await
            {
                Ok(target) => {
                    self.submit_all(
                        &target,
                        tests,
                        &reporter,
                        &cancel,
                        &running,
                        options,
                        &mut handle,
                    )
                    .await
                }
                Err(e) => {
                    warn!("Run {} refused: {}", handle.run_id, e);
                    let message = e.to_string();
                    for test in &tests {
                        reporter.errored(test, &message, None);
                        handle.summary.record(TestOutcome::Errored);
                    }
                }
            }
        }

        if running.seal() {
            reporter.end();
        }
        handle
    }

    #[allow(clippy::too_many_arguments)]
    async fn submit_all(
        &self,
        target: &GitInfo,
        tests: Vec<TestCase>,
        reporter: &Arc<dyn ResultReporter>,
        cancel: &CancellationToken,
        running: &Arc<RunningSet>,
        options: RunOptions,
        handle: &mut RunHandle,
    ) {
        for submission in plan_submissions(tests, options.combine_kontrol, reporter, &mut handle.summary) {
            if cancel.is_cancelled() {
                for t in &submission.targets {
                    reporter.skipped(&t.test);
                    handle.summary.record(TestOutcome::Skipped);
                }
                continue;
            }

            let mut targets = Vec::with_capacity(submission.targets.len());
            for t in submission.targets {
                if running.insert(t.test.identity.clone()) {
                    reporter.enqueued(&t.test);
                    targets.push(t);
                } else {
                    warn!("{} is already part of run {}, skipping duplicate", t.test, handle.run_id);
                }
            }
            if targets.is_empty() {
                continue;
            }

            let job_id = match self.submit(target, submission.kind, &targets).await {
                Ok(job_id) => job_id,
                Err(e) => {
                    warn!("Submission failed: {}", e);
                    let message = format!("Failed to submit job: {}", e);
                    for t in &targets {
                        self.abandon(t, &message, reporter, running, &mut handle.summary);
                    }
                    continue;
                }
            };

            let mut persisted = Vec::with_capacity(targets.len());
            for t in targets {
                match self.store.set_job_id(&t.test.identity, &job_id) {
                    Ok(()) => {
                        reporter.append_output(Some(&t.test), &format!("Submitted KaaS job {}", job_id));
                        persisted.push(t);
                    }
                    Err(e) => {
                        let message = format!("Job {} was submitted but its id could not be saved: {}", job_id, e);
                        self.abandon(&t, &message, reporter, running, &mut handle.summary);
                    }
                }
            }

            if !persisted.is_empty() {
                handle.push_poller(self.spawn_poller(
                    job_id,
                    persisted,
                    reporter.clone(),
                    cancel.clone(),
                    running.clone(),
                ));
            }
        }
    }

    async fn submit(&self, target: &GitInfo, kind: JobKind, targets: &[PollTarget]) -> Result<String> {
        let profiles = targets.iter().map(|t| t.profile.clone()).collect();
        let req = CreateJob::new(kind, target.branch.clone(), profiles, self.config.base_url.clone());
        let created = self.api.create_job(&target.owner, &target.repo, &req).await?;
        info!(
            "Submitted {} job {} for {} test(s) on {}/{}@{}",
            kind,
            created.job_id,
            targets.len(),
            target.owner,
            target.repo,
            target.branch
        );
        Ok(created.job_id)
    }

    /// Errors a test that will never be polled
    fn abandon(
        &self,
        target: &PollTarget,
        message: &str,
        reporter: &Arc<dyn ResultReporter>,
        running: &RunningSet,
        summary: &mut RunSummary,
    ) {
        reporter.errored(&target.test, message, None);
        summary.record(TestOutcome::Errored);
        if running.complete(&target.test.identity) {
            reporter.end();
        }
    }

    /// Polls `job_id` in its own task; the poller that empties the run ends it
    pub(super) fn spawn_poller(
        &self,
        job_id: String,
        targets: Vec<PollTarget>,
        reporter: Arc<dyn ResultReporter>,
        cancel: CancellationToken,
        running: Arc<RunningSet>,
    ) -> JoinHandle<Vec<TestOutcome>> {
        let poller = JobPoller::new(self.api.clone(), reporter.clone(), &self.config);
        tokio::spawn(async move {
            let states = poller.poll(&job_id, &targets, &cancel).await;
            for t in &targets {
                if running.complete(&t.test.identity) {
                    reporter.end();
                }
            }
            states.into_iter().map(TestOutcome::from).collect()
        })
    }
}

/// Splits a batch into submissions in batch order
///
/// Tests without a run kind are errored right away.
fn plan_submissions(
    tests: Vec<TestCase>,
    combine_kontrol: bool,
    reporter: &Arc<dyn ResultReporter>,
    summary: &mut RunSummary,
) -> Vec<Submission> {
    let mut submissions: Vec<Submission> = Vec::new();
    let mut combined: Option<usize> = None;

    for test in tests {
        let Some(run) = test.run.clone() else {
            reporter.errored(&test, "Unknown test kind", None);
            summary.record(TestOutcome::Errored);
            continue;
        };
        let Some(target) = PollTarget::for_test(test) else {
            continue;
        };

        let combinable = combine_kontrol && matches!(run, RunKind::Kontrol(KontrolRun::Profile { .. }));
        match combined {
            Some(index) if combinable => submissions[index].targets.push(target),
            _ => {
                if combinable {
                    combined = Some(submissions.len());
                }
                submissions.push(Submission {
                    kind: run.job_kind(),
                    targets: vec![target],
                });
            }
        }
    }
    submissions
}
