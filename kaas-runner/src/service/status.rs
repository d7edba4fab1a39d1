//! Workspace sync status
//!
//! Checks whether a workspace folder is ready to be proven on KaaS. The
//! checks run in order and stop at the first blocking failure, since later
//! ones depend on it (no remote means no branch, and so on).
//!
//! Nothing is changed on either side: a missing vault is reported here and
//! only linked when a run is submitted.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::git::SourceControl;
use crate::repository::VaultRepository;

/// A single readiness check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncCheck {
    GitRepository,
    KaasToken,
    GitHubOrigin,
    RemoteBranch,
    VaultLinked,
    WorkingTree,
    UnpushedCommits,
}

/// Outcome of a check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    Passed,
    /// Runs still work but may not prove what is on disk
    Warning,
    Failed,
}

impl SyncCheck {
    /// Human readable line for the outcome of this check
    pub fn message(self, state: CheckState) -> &'static str {
        let passed = state == CheckState::Passed;
        match (self, passed) {
            (SyncCheck::GitRepository, true) => "Your workspace folder is a Git repository.",
            (SyncCheck::GitRepository, false) => {
                "Your workspace folder is not a Git repository. Please initialize it."
            }
            (SyncCheck::KaasToken, true) => "You have a valid KaaS API token.",
            (SyncCheck::KaasToken, false) => "You do not have a valid KaaS API token.",
            (SyncCheck::GitHubOrigin, true) => "Your remote origin points to a GitHub repository.",
            (SyncCheck::GitHubOrigin, false) => {
                "Your remote origin does not point to a GitHub repository."
            }
            (SyncCheck::RemoteBranch, true) => "Your branch is tracking a remote branch.",
            (SyncCheck::RemoteBranch, false) => "Your branch is not tracking a remote branch.",
            (SyncCheck::VaultLinked, true) => "Your repository is linked to a KaaS vault.",
            (SyncCheck::VaultLinked, false) => "Your repository is not linked to a KaaS vault.",
            (SyncCheck::WorkingTree, true) => "You have no local changes in your worktree.",
            (SyncCheck::WorkingTree, false) => "You have local changes in your worktree.",
            (SyncCheck::UnpushedCommits, true) => "You don't have any unpushed commits.",
            (SyncCheck::UnpushedCommits, false) => {
                "You have unpushed commits. Please push them to GitHub."
            }
        }
    }
}

/// Result of one check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusItem {
    pub check: SyncCheck,
    pub state: CheckState,
}

impl StatusItem {
    fn new(check: SyncCheck, state: CheckState) -> Self {
        Self { check, state }
    }

    pub fn message(&self) -> &'static str {
        self.check.message(self.state)
    }
}

/// Readiness of one workspace folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceStatus {
    pub folder: PathBuf,
    pub items: Vec<StatusItem>,
}

impl WorkspaceStatus {
    /// No check failed; warnings are allowed
    pub fn is_ready(&self) -> bool {
        self.items.iter().all(|i| i.state != CheckState::Failed)
    }

    pub fn state_of(&self, check: SyncCheck) -> Option<CheckState> {
        self.items
            .iter()
            .find(|i| i.check == check)
            .map(|i| i.state)
    }
}

fn passed_if(ok: bool) -> CheckState {
    if ok {
        CheckState::Passed
    } else {
        CheckState::Failed
    }
}

/// Warns on local changes, fails when git could not tell
fn warn_if(changes: crate::Result<bool>) -> CheckState {
    match changes {
        Ok(false) => CheckState::Passed,
        Ok(true) => CheckState::Warning,
        Err(e) => {
            debug!("Git check failed: {}", e);
            CheckState::Failed
        }
    }
}

/// Runs every readiness check for `folder`
pub async fn workspace_status(
    git: &dyn SourceControl,
    kaas: &dyn VaultRepository,
    folder: &Path,
) -> WorkspaceStatus {
    let (repository, user) = tokio::join!(git.is_repository(folder), kaas.get_current_user());
    if let Err(e) = &user {
        debug!("Token check failed: {}", e);
    }
    let token_valid = user.is_ok();

    let mut status = WorkspaceStatus {
        folder: folder.to_path_buf(),
        items: vec![
            StatusItem::new(SyncCheck::GitRepository, passed_if(repository)),
            StatusItem::new(SyncCheck::KaasToken, passed_if(token_valid)),
        ],
    };
    if !repository {
        return status;
    }

    let info = git.git_info(folder).await;
    status
        .items
        .push(StatusItem::new(SyncCheck::GitHubOrigin, passed_if(info.is_ok())));
    let Ok(info) = info else {
        return status;
    };

    let upstream = matches!(git.upstream_branch(folder).await, Ok(Some(_)));
    status
        .items
        .push(StatusItem::new(SyncCheck::RemoteBranch, passed_if(upstream)));
    if !upstream {
        return status;
    }

    // Vault lookups need a working token
    if token_valid {
        let linked = vault_linked(kaas, &info.owner, &info.repo).await;
        status
            .items
            .push(StatusItem::new(SyncCheck::VaultLinked, passed_if(linked)));
        if !linked {
            return status;
        }
    }

    let (working_tree, unpushed) = tokio::join!(
        git.working_tree_changes(folder),
        git.unpushed_commits(folder)
    );
    status
        .items
        .push(StatusItem::new(SyncCheck::WorkingTree, warn_if(working_tree)));
    status
        .items
        .push(StatusItem::new(SyncCheck::UnpushedCommits, warn_if(unpushed)));
    status
}

async fn vault_linked(kaas: &dyn VaultRepository, organization: &str, vault: &str) -> bool {
    let known_org = kaas.list_organizations().await.is_ok_and(|orgs| {
        orgs.iter()
            .any(|org| org.name.eq_ignore_ascii_case(organization))
    });
    known_org && kaas.get_vault(organization, vault).await.is_ok()
}
