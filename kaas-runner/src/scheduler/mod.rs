//! Scheduler layer
//!
//! This layer tracks submitted jobs until they reach a terminal status and
//! maps the final job records back onto the tests they were submitted for.

pub mod matching;
pub mod poller;
pub mod running;

pub use matching::{PollTarget, select_record};
pub use poller::{JobPoller, PollState};
pub use running::RunningSet;
