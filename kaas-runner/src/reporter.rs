//! Result reporting
//!
//! The runner never talks to a UI directly. Every state change of a test is
//! pushed through [`ResultReporter`], which a terminal, an editor bridge or a
//! test harness can implement.

use std::time::Duration;

use kaas_core::domain::test::TestCase;

/// Sink for test result events of one aggregate run
///
/// Implementations are shared between polling tasks, so they must be
/// `Send + Sync` and take `&self`.
pub trait ResultReporter: Send + Sync {
    /// The test was accepted into the run and is waiting for its job
    fn enqueued(&self, test: &TestCase);

    /// The remote job for the test started running
    fn started(&self, test: &TestCase);

    /// The job finished successfully
    fn passed(&self, test: &TestCase, duration: Duration);

    /// The job finished with a failing status
    fn failed(&self, test: &TestCase, message: &str, duration: Duration);

    /// The test could not be run to completion (cancelled, rejected, unreachable)
    fn errored(&self, test: &TestCase, message: &str, duration: Option<Duration>);

    /// The test was never submitted because the run was cancelled first
    fn skipped(&self, test: &TestCase);

    /// Free-form output attached to a test, or to the run when `test` is `None`
    fn append_output(&self, test: Option<&TestCase>, output: &str);

    /// The aggregate run is over; called exactly once per run
    fn end(&self);
}

/// Final result of a single test within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestOutcome {
    Passed,
    Failed,
    Errored,
    Skipped,
}

impl std::fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestOutcome::Passed => write!(f, "passed"),
            TestOutcome::Failed => write!(f, "failed"),
            TestOutcome::Errored => write!(f, "errored"),
            TestOutcome::Skipped => write!(f, "skipped"),
        }
    }
}
