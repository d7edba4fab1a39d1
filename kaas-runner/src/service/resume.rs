//! Resume tracking of stored jobs
//!
//! On startup, tests whose stored job is still pending or running are
//! polled again. Finished jobs are left alone so a new session starts from a
//! clean slate.

use std::sync::Arc;

use kaas_core::domain::test::TestCase;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::reporter::ResultReporter;
use crate::repository::KaasApi;
use crate::scheduler::{PollTarget, RunningSet};
use crate::service::run::{RunHandle, TestRunService};

impl<A: KaasApi + 'static> TestRunService<A> {
    /// Resumes polling for the in-flight jobs stored for `tests`
    pub async fn resume(
        &self,
        tests: Vec<TestCase>,
        reporter: Arc<dyn ResultReporter>,
        cancel: CancellationToken,
    ) -> RunHandle {
        let mut handle = RunHandle::new();
        let running = Arc::new(RunningSet::new());

        for test in tests {
            if cancel.is_cancelled() {
                break;
            }
            let Some(job_id) = self.store.get_job_id(&test.identity) else {
                continue;
            };

            let job = match self.api.get_job(&job_id).await {
                Ok(job) => job,
                Err(e) if e.is_not_found() => {
                    debug!("Stored job {} for {} no longer exists", job_id, test);
                    continue;
                }
                Err(e) => {
                    warn!("Could not resume job {} for {}: {}", job_id, test, e);
                    continue;
                }
            };
            if job.is_terminal() {
                debug!("Job {} for {} already finished ({})", job_id, test, job.status);
                continue;
            }

            let Some(target) = PollTarget::for_test(test) else {
                continue;
            };
            if !running.insert(target.test.identity.clone()) {
                continue;
            }
            info!("Resuming {} job {} for {}", job.status, job_id, target.test);
            reporter.enqueued(&target.test);
            handle.push_poller(self.spawn_poller(
                job_id,
                vec![target],
                reporter.clone(),
                cancel.clone(),
                running.clone(),
            ));
        }

        if running.seal() {
            reporter.end();
        }
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::state::JobStateStore;
    use crate::testing::{Event, FakeGit, FakeKaas, RecordingReporter, Step};
    use kaas_core::domain::job::JobStatus;
    use kaas_core::domain::test::{KontrolRun, RunKind, TestIdentity};
    use std::time::Duration;

    fn profile(name: &str) -> TestCase {
        TestCase {
            identity: TestIdentity::new(Some("/ws/kontrol.toml".into()), name),
            label: name.to_string(),
            run: Some(RunKind::Kontrol(KontrolRun::Profile {
                profile: name.to_string(),
            })),
        }
    }

    #[tokio::test]
    async fn test_resume_polls_only_in_flight_jobs() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JobStateStore::open(dir.path().join("state.json")).unwrap());
        let tests = vec![
            profile("running"),
            profile("finished"),
            profile("gone"),
            profile("never-run"),
        ];
        store.set_job_id(&tests[0].identity, "j-running").unwrap();
        store.set_job_id(&tests[1].identity, "j-finished").unwrap();
        store.set_job_id(&tests[2].identity, "j-gone").unwrap();

        let kaas = Arc::new(FakeKaas::new());
        kaas.script(
            "j-running",
            vec![
                Step::Status(JobStatus::Running),
                Step::Status(JobStatus::Running),
                Step::Status(JobStatus::Success),
            ],
        );
        kaas.script("j-finished", vec![Step::Status(JobStatus::Failure)]);

        let config = Config::default().with_poll_interval(Duration::from_millis(1));
        let service = TestRunService::new(kaas.clone(), Arc::new(FakeGit::clean()), store, config);
        let reporter = Arc::new(RecordingReporter::default());

        let handle = service
            .resume(tests, reporter.clone(), CancellationToken::new())
            .await;
        let summary = tokio::time::timeout(Duration::from_secs(5), handle.wait())
            .await
            .unwrap();

        assert_eq!(summary.passed, 1);
        assert_eq!(summary.total(), 1);
        assert_eq!(
            reporter.terminal(),
            vec![Event::Passed("running".to_string(), Duration::from_secs(2))]
        );
        assert_eq!(reporter.ends(), 1);
        assert_eq!(kaas.fetches("j-finished"), 1);
    }

    #[tokio::test]
    async fn test_resume_with_nothing_stored_ends_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JobStateStore::open(dir.path().join("state.json")).unwrap());
        let service = TestRunService::new(
            Arc::new(FakeKaas::new()),
            Arc::new(FakeGit::clean()),
            store,
            Config::default(),
        );
        let reporter = Arc::new(RecordingReporter::default());

        let handle = service
            .resume(vec![profile("default")], reporter.clone(), CancellationToken::new())
            .await;
        assert_eq!(handle.pending_jobs(), 0);
        assert_eq!(reporter.events(), vec![Event::End]);
    }
}
