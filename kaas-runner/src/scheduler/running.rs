//! Running set of an aggregate run
//!
//! Tests are inserted while a batch is submitted and removed by their
//! poller. The run finishes once the batch is sealed and the set is empty.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use kaas_core::domain::test::TestIdentity;

#[derive(Debug, Default)]
struct RunningState {
    running: HashSet<TestIdentity>,
    sealed: bool,
    finalized: bool,
}

impl RunningState {
    /// Finalizes at most once, and only when nothing can be added anymore
    fn try_finalize(&mut self) -> bool {
        if self.sealed && self.running.is_empty() && !self.finalized {
            self.finalized = true;
            return true;
        }
        false
    }
}

/// Tests of one aggregate run that have not reached a terminal state
#[derive(Debug, Default)]
pub struct RunningSet {
    state: Mutex<RunningState>,
}

impl RunningSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a test; returns false if it was already running
    pub fn insert(&self, identity: TestIdentity) -> bool {
        self.lock().running.insert(identity)
    }

    /// Removes a finished test
    ///
    /// Returns true when this removal finishes the run; the caller then ends it.
    pub fn complete(&self, identity: &TestIdentity) -> bool {
        let mut state = self.lock();
        state.running.remove(identity);
        state.try_finalize()
    }

    /// Marks that the batch will not add more tests
    ///
    /// Returns true when the run is already over (every test finished, or
    /// none was started); the caller then ends it.
    pub fn seal(&self) -> bool {
        let mut state = self.lock();
        state.sealed = true;
        state.try_finalize()
    }

    fn lock(&self) -> MutexGuard<'_, RunningState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
