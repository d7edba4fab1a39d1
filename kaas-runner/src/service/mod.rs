//! Service layer
//!
//! Services contain the business logic of a run. They orchestrate the
//! repositories, the state store and the scheduler:
//! - Pre-run validation of the workspace and its vault
//! - Submission of a batch of tests as one aggregate run
//! - Resuming jobs stored by a previous session
//! - Reporting whether a workspace is in sync with GitHub and KaaS

mod resume;
mod run;
mod status;
mod validation;

pub use run::{RunHandle, RunOptions, RunSummary, TestRunService};
pub use status::{CheckState, StatusItem, SyncCheck, WorkspaceStatus, workspace_status};
pub use validation::{ValidationError, validate_workspace, verify_vault_exists};
