//! Job poller
//!
//! Fetches the status of one submitted job at a fixed interval until the job
//! reaches a terminal status, then reports a result for every test the job
//! was submitted for.

use std::sync::Arc;
use std::time::Duration;

use kaas_core::domain::job::{JobRecord, JobStatus};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::RunError;
use crate::reporter::ResultReporter;
use crate::repository::JobRepository;
use crate::scheduler::matching::{PollTarget, select_record};

/// Lifecycle of a polled job as seen by its tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// Submitted, no status observed yet
    Submitted,
    /// At least one non-terminal status observed
    Polling,
    Passed,
    Failed,
    /// Cancelled remotely, rejected, or polling stopped locally
    Errored,
}

/// Polls a single job and reports its outcome
pub struct JobPoller {
    jobs: Arc<dyn JobRepository>,
    reporter: Arc<dyn ResultReporter>,
    interval: Duration,
    max_transient_failures: Option<u32>,
}

impl JobPoller {
    /// Creates a new job poller
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        reporter: Arc<dyn ResultReporter>,
        config: &Config,
    ) -> Self {
        Self {
            jobs,
            reporter,
            interval: config.poll_interval,
            max_transient_failures: config.max_transient_failures,
        }
    }

    /// Polls `job_id` until it is terminal, the token is cancelled, or a
    /// non-transient error occurs
    ///
    /// Returns the final state of each target, in order.
    pub async fn poll(
        &self,
        job_id: &str,
        targets: &[PollTarget],
        cancel: &CancellationToken,
    ) -> Vec<PollState> {
        info!(
            "Polling job {} for {} test(s) every {:?}",
            job_id,
            targets.len(),
            self.interval
        );

        let mut state = PollState::Submitted;
        let mut last_status: Option<JobStatus> = None;
        let mut transient_failures = 0u32;

        loop {
            if cancel.is_cancelled() {
                return self.stop_cancelled(job_id, targets, state);
            }

            // A stalled request must not outlive the run
            let fetched = tokio::select! {
                _ = cancel.cancelled() => return self.stop_cancelled(job_id, targets, state),
                fetched = self.jobs.get_job(job_id) => fetched,
            };

            match fetched {
                Ok(job) => {
                    transient_failures = 0;
                    if state == PollState::Submitted {
                        debug!("Job {}: {:?} -> {:?}", job_id, state, PollState::Polling);
                        state = PollState::Polling;
                    }

                    match last_status {
                        Some(prev) if !prev.can_transition_to(job.status) => {
                            warn!(
                                "Job {} reported {} after {}, ignoring",
                                job_id, job.status, prev
                            );
                        }
                        _ => {
                            if last_status != Some(job.status) {
                                debug!("Job {} is {}", job_id, job.status);
                                if job.status == JobStatus::Running {
                                    for target in targets {
                                        self.reporter.started(&target.test);
                                    }
                                }
                            }
                            last_status = Some(job.status);

                            if job.is_terminal() {
                                info!(
                                    "Job {} finished with status {} after {:?}",
                                    job_id,
                                    job.status,
                                    job.elapsed()
                                );
                                return targets.iter().map(|t| self.report(&job, t)).collect();
                            }
                        }
                    }
                }
                Err(e) if e.is_transient() => {
                    transient_failures += 1;
                    warn!(
                        "Failed to fetch status of job {} (attempt {}), retrying: {}",
                        job_id, transient_failures, e
                    );
                    let exhausted = self
                        .max_transient_failures
                        .is_some_and(|max| transient_failures >= max);
                    if exhausted {
                        let message = format!("Error fetching job status: {}", e);
                        return self.error_all(targets, &message);
                    }
                }
                Err(e) => {
                    warn!("Giving up on job {}: {}", job_id, e);
                    let message = format!("Error fetching job status: {}", e);
                    return self.error_all(targets, &message);
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => return self.stop_cancelled(job_id, targets, state),
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }

    /// Reports the terminal record matching `target`
    fn report(&self, job: &JobRecord, target: &PollTarget) -> PollState {
        let record = select_record(job, target);
        // A child still pending under a finished parent never will finish.
        let record = if record.is_terminal() { record } else { job };
        let url = self.jobs.job_url(record);
        let test = &target.test;

        match record.status {
            JobStatus::Success => {
                self.reporter.append_output(
                    Some(test),
                    &format!("Run completed successfully. See details here: {}", url),
                );
                self.reporter.passed(test, record.elapsed());
                PollState::Passed
            }
            JobStatus::Failure | JobStatus::ProcessingFailed => {
                let err = RunError::JobTerminalFailure {
                    job_id: record.id.clone(),
                    status: record.status,
                };
                info!("{} ({})", err, test);
                self.reporter.failed(
                    test,
                    &format!("Run failed. See run details here: {}", url),
                    record.elapsed(),
                );
                PollState::Failed
            }
            JobStatus::Cancelled => {
                self.reporter.errored(
                    test,
                    &format!("Run was cancelled. See run details here: {}", url),
                    Some(record.elapsed()),
                );
                PollState::Errored
            }
            JobStatus::Pending | JobStatus::Running => {
                self.reporter.errored(
                    test,
                    &format!("Job {} ended without a result", record.id),
                    None,
                );
                PollState::Errored
            }
        }
    }

    fn stop_cancelled(
        &self,
        job_id: &str,
        targets: &[PollTarget],
        state: PollState,
    ) -> Vec<PollState> {
        info!("Stopped polling job {} in state {:?}: run cancelled", job_id, state);
        let message = format!(
            "Polling cancelled. Job {} may still be running on KaaS.",
            job_id
        );
        self.error_all(targets, &message)
    }

    fn error_all(&self, targets: &[PollTarget], message: &str) -> Vec<PollState> {
        targets
            .iter()
            .map(|target| {
                self.reporter.errored(&target.test, message, None);
                PollState::Errored
            })
            .collect()
    }
}
