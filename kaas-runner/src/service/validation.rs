//! Pre-run validation
//!
//! Runs once per batch, before anything is submitted:
//! - Refuses a workspace with uncommitted or unpushed changes
//! - Resolves organization, vault and branch from git
//! - Makes sure the vault exists on KaaS, linking it when missing

use std::path::Path;

use kaas_client::ClientError;
use thiserror::Error;
use tracing::{debug, info};

use crate::error::RunError;
use crate::git::{GitInfo, SourceControl};
use crate::repository::VaultRepository;

/// Reasons a batch is refused before submission
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Job cancelled due to dirty git state.")]
    DirtyWorkspace,

    #[error("Could not determine the KaaS vault for this workspace: {0}")]
    Git(#[source] RunError),

    #[error(
        "Organization {organization} is not available on KaaS. Install the GitHub app to grant access: {app_url}"
    )]
    UnknownOrganization {
        organization: String,
        app_url: String,
    },

    #[error("Vault {organization}/{vault} could not be linked: {source}")]
    VaultLink {
        organization: String,
        vault: String,
        #[source]
        source: ClientError,
    },

    #[error("Failed to verify vault on KaaS: {0}")]
    Remote(#[source] ClientError),
}

/// Validates a workspace and returns where its jobs are submitted
pub async fn validate_workspace(
    git: &dyn SourceControl,
    vaults: &dyn VaultRepository,
    workspace: &Path,
    allow_dirty: bool,
    github_app_url: &str,
) -> Result<GitInfo, ValidationError> {
    if !allow_dirty {
        let dirty = git
            .has_local_changes(workspace)
            .await
            .map_err(ValidationError::Git)?;
        if dirty {
            return Err(ValidationError::DirtyWorkspace);
        }
    }

    let info = git
        .git_info(workspace)
        .await
        .map_err(ValidationError::Git)?;
    debug!(
        "Workspace {} maps to {}/{} on branch {}",
        workspace.display(),
        info.owner,
        info.repo,
        info.branch
    );

    verify_vault_exists(vaults, &info.owner, &info.repo, github_app_url).await?;
    Ok(info)
}

/// Checks that `organization/vault` exists, linking the vault if needed
pub async fn verify_vault_exists(
    vaults: &dyn VaultRepository,
    organization: &str,
    vault: &str,
    github_app_url: &str,
) -> Result<(), ValidationError> {
    let organizations = vaults
        .list_organizations()
        .await
        .map_err(ValidationError::Remote)?;

    // GitHub owners are case-insensitive
    if !organizations
        .iter()
        .any(|org| org.name.eq_ignore_ascii_case(organization))
    {
        return Err(ValidationError::UnknownOrganization {
            organization: organization.to_string(),
            app_url: github_app_url.to_string(),
        });
    }

    match vaults.get_vault(organization, vault).await {
        Ok(_) => Ok(()),
        Err(e) if e.is_not_found() => {
            info!("Vault {}/{} not found, linking it", organization, vault);
            vaults
                .link_vault(organization, vault)
                .await
                .map(|_| ())
                .map_err(|source| ValidationError::VaultLink {
                    organization: organization.to_string(),
                    vault: vault.to_string(),
                    source,
                })
        }
        Err(e) => Err(ValidationError::Remote(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeGit, FakeKaas};

    const APP_URL: &str = "https://github.com/apps/kaas-test";

    #[tokio::test]
    async fn test_clean_workspace_resolves_target() {
        let kaas = FakeKaas::new();
        let info = validate_workspace(&FakeGit::clean(), &kaas, Path::new("/ws"), false, APP_URL)
            .await
            .unwrap();
        assert_eq!(info.owner, "acme");
        assert_eq!(info.repo, "proofs");
        assert_eq!(info.branch, "main");
    }

    #[tokio::test]
    async fn test_dirty_workspace_is_refused_unless_allowed() {
        let kaas = FakeKaas::new();
        let git = FakeGit {
            dirty: true,
            ..FakeGit::clean()
        };

        let err = validate_workspace(&git, &kaas, Path::new("/ws"), false, APP_URL)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Job cancelled due to dirty git state.");

        assert!(
            validate_workspace(&git, &kaas, Path::new("/ws"), true, APP_URL)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_unpushed_or_untracked_branch_is_dirty() {
        let kaas = FakeKaas::new();
        for git in [
            FakeGit {
                unpushed: true,
                ..FakeGit::clean()
            },
            FakeGit {
                upstream: false,
                ..FakeGit::clean()
            },
        ] {
            let err = validate_workspace(&git, &kaas, Path::new("/ws"), false, APP_URL)
                .await
                .unwrap_err();
            assert!(matches!(err, ValidationError::DirtyWorkspace));
        }
    }

    #[tokio::test]
    async fn test_unresolvable_remote() {
        let kaas = FakeKaas::new();
        let git = FakeGit {
            info: None,
            ..FakeGit::clean()
        };
        let err = validate_workspace(&git, &kaas, Path::new("/ws"), false, APP_URL)
            .await
            .unwrap_err();
        assert!(matches!(err, ValidationError::Git(RunError::Git(_))));
    }

    #[tokio::test]
    async fn test_unknown_organization_points_at_app() {
        let mut kaas = FakeKaas::new();
        kaas.organizations = vec!["someone-else".to_string()];
        let err = verify_vault_exists(&kaas, "acme", "proofs", APP_URL)
            .await
            .unwrap_err();
        assert!(err.to_string().contains(APP_URL));
    }

    #[tokio::test]
    async fn test_missing_vault_is_linked() {
        let kaas = FakeKaas::new();
        kaas.vaults.lock().unwrap().clear();

        verify_vault_exists(&kaas, "ACME", "proofs", APP_URL)
            .await
            .unwrap();
        assert_eq!(*kaas.vaults.lock().unwrap(), vec!["proofs".to_string()]);
    }

    #[tokio::test]
    async fn test_link_failure() {
        let mut kaas = FakeKaas::new();
        kaas.link_fails = true;
        kaas.vaults.lock().unwrap().clear();

        let err = verify_vault_exists(&kaas, "acme", "proofs", APP_URL)
            .await
            .unwrap_err();
        assert!(matches!(err, ValidationError::VaultLink { .. }));
    }
}
