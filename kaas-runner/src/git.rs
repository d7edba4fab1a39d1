//! Git origin resolution
//!
//! KaaS identifies a vault by the GitHub owner and repository of the
//! workspace's `origin` remote, and runs jobs against the current branch.

use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, RunError};

/// Organization, vault and branch of a checkout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitInfo {
    /// GitHub owner, used as the KaaS organization
    pub owner: String,
    /// Repository name, used as the KaaS vault
    pub repo: String,
    pub branch: String,
}

/// Queries against the workspace checkout
#[async_trait]
pub trait SourceControl: Send + Sync {
    /// Whether the folder is inside a git working tree
    async fn is_repository(&self, workspace: &Path) -> bool;

    /// Resolves owner, repository and branch from the `origin` remote
    async fn git_info(&self, workspace: &Path) -> Result<GitInfo>;

    /// Remote branch tracked by the current branch, if any
    async fn upstream_branch(&self, workspace: &Path) -> Result<Option<String>>;

    /// Uncommitted or untracked files
    async fn working_tree_changes(&self, workspace: &Path) -> Result<bool>;

    /// Commits not yet on the upstream branch
    async fn unpushed_commits(&self, workspace: &Path) -> Result<bool>;

    /// Whether there are uncommitted changes or commits not pushed upstream
    ///
    /// A branch without upstream has never been pushed and counts as changed.
    async fn has_local_changes(&self, workspace: &Path) -> Result<bool> {
        if self.working_tree_changes(workspace).await? {
            return Ok(true);
        }
        if self.upstream_branch(workspace).await?.is_none() {
            return Ok(true);
        }
        self.unpushed_commits(workspace).await
    }
}

/// [`SourceControl`] backed by the `git` binary
#[derive(Debug, Clone)]
pub struct GitCli {
    binary: String,
}

impl GitCli {
    pub fn new() -> Self {
        Self {
            binary: "git".to_string(),
        }
    }

    async fn run(&self, workspace: &Path, args: &[&str]) -> Result<String> {
        debug!("Running {} {}", self.binary, args.join(" "));
        let output = Command::new(&self.binary)
            .args(args)
            .current_dir(workspace)
            .output()
            .await
            .map_err(|e| RunError::Git(format!("Failed to run {}: {}", self.binary, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RunError::Git(format!(
                "git {} failed with {}: {}",
                args.join(" "),
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceControl for GitCli {
    async fn is_repository(&self, workspace: &Path) -> bool {
        self.run(workspace, &["rev-parse", "--is-inside-work-tree"])
            .await
            .is_ok_and(|inside| inside == "true")
    }

    async fn git_info(&self, workspace: &Path) -> Result<GitInfo> {
        let (remote, branch) = tokio::try_join!(
            self.run(workspace, &["remote", "get-url", "origin"]),
            self.run(workspace, &["rev-parse", "--abbrev-ref", "HEAD"]),
        )?;

        let (owner, repo) = parse_remote_url(&remote).ok_or_else(|| {
            RunError::Git(format!("Could not parse git remote URL: {}", remote))
        })?;

        Ok(GitInfo {
            owner,
            repo,
            branch,
        })
    }

    async fn upstream_branch(&self, workspace: &Path) -> Result<Option<String>> {
        match self
            .run(
                workspace,
                &["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{upstream}"],
            )
            .await
        {
            Ok(upstream) => Ok(Some(upstream)),
            Err(e) => {
                debug!("No upstream for current branch: {}", e);
                Ok(None)
            }
        }
    }

    async fn working_tree_changes(&self, workspace: &Path) -> Result<bool> {
        let status = self.run(workspace, &["status", "--porcelain"]).await?;
        Ok(!status.is_empty())
    }

    async fn unpushed_commits(&self, workspace: &Path) -> Result<bool> {
        let count = self
            .run(workspace, &["rev-list", "--count", "@{upstream}..HEAD"])
            .await?;
        Ok(count.parse::<u64>().unwrap_or(0) > 0)
    }
}

/// Extracts `(owner, repo)` from a GitHub remote URL
///
/// Accepts HTTPS (`https://github.com/owner/repo.git`) and SSH
/// (`git@github.com:owner/repo.git`) forms.
pub fn parse_remote_url(url: &str) -> Option<(String, String)> {
    let (_, rest) = url.trim().split_once("github.com")?;
    let rest = rest.strip_prefix(['/', ':'])?;

    let mut parts = rest.splitn(2, '/');
    let owner = parts.next()?;
    let repo = parts.next()?.trim_end_matches('/');
    let repo = repo.strip_suffix(".git").unwrap_or(repo);

    let owner_ok = !owner.is_empty()
        && owner
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    let repo_ok = !repo.is_empty()
        && repo
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));

    (owner_ok && repo_ok).then(|| (owner.to_string(), repo.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::state::JobStateStore;
    use kaas_core::domain::test::TestIdentity;

    #[test]
    fn test_parse_https_remote() {
        assert_eq!(
            parse_remote_url("https://github.com/runtimeverification/kaas-demo.git"),
            Some((
                "runtimeverification".to_string(),
                "kaas-demo".to_string()
            ))
        );
        assert_eq!(
            parse_remote_url("https://github.com/acme/proofs"),
            Some(("acme".to_string(), "proofs".to_string()))
        );
    }

    #[test]
    fn test_parse_ssh_remote() {
        assert_eq!(
            parse_remote_url("git@github.com:acme/my.repo.git\n"),
            Some(("acme".to_string(), "my.repo".to_string()))
        );
        assert_eq!(
            parse_remote_url("ssh://git@github.com/acme/proofs.git"),
            Some(("acme".to_string(), "proofs".to_string()))
        );
    }

    #[test]
    fn test_reject_other_hosts_and_shapes() {
        assert_eq!(parse_remote_url("https://gitlab.com/acme/proofs.git"), None);
        assert_eq!(parse_remote_url("https://github.com/acme"), None);
        assert_eq!(parse_remote_url("https://github.com/acme/nested/path"), None);
    }

    #[tokio::test]
    async fn test_git_info_outside_repository_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let git = GitCli::new();
        assert!(!git.is_repository(dir.path()).await);
        let result = git.git_info(dir.path()).await;
        assert!(matches!(result, Err(RunError::Git(_))));
    }

    fn git(dir: &Path, args: &[&str]) {
        let status = std::process::Command::new("git")
            .args([
                "-c",
                "user.name=kaas",
                "-c",
                "user.email=kaas@example.com",
                "-c",
                "commit.gpgsign=false",
            ])
            .args(args)
            .current_dir(dir)
            .status()
            .unwrap();
        assert!(status.success(), "git {:?} failed", args);
    }

    /// A checkout whose branch is pushed to a local bare remote
    fn pushed_checkout(dir: &Path) -> std::path::PathBuf {
        let remote = dir.join("remote.git");
        let ws = dir.join("ws");
        std::fs::create_dir_all(&remote).unwrap();
        std::fs::create_dir_all(&ws).unwrap();
        git(&remote, &["init", "-q", "--bare"]);
        git(&ws, &["init", "-q"]);
        git(&ws, &["commit", "-q", "--allow-empty", "-m", "init"]);
        git(&ws, &["remote", "add", "origin", remote.to_str().unwrap()]);
        git(&ws, &["push", "-q", "-u", "origin", "HEAD"]);
        ws
    }

    #[tokio::test]
    async fn test_local_changes_in_real_checkout() {
        let dir = tempfile::tempdir().unwrap();
        let ws = pushed_checkout(dir.path());
        let cli = GitCli::new();

        assert!(cli.is_repository(&ws).await);
        assert!(cli.upstream_branch(&ws).await.unwrap().is_some());
        assert!(!cli.has_local_changes(&ws).await.unwrap());

        git(&ws, &["commit", "-q", "--allow-empty", "-m", "local"]);
        assert!(cli.unpushed_commits(&ws).await.unwrap());
        assert!(cli.has_local_changes(&ws).await.unwrap());

        git(&ws, &["push", "-q"]);
        std::fs::write(ws.join("Counter.sol"), "contract Counter {}\n").unwrap();
        assert!(cli.working_tree_changes(&ws).await.unwrap());
    }

    #[tokio::test]
    async fn test_state_document_keeps_checkout_clean() {
        let dir = tempfile::tempdir().unwrap();
        let ws = pushed_checkout(dir.path());
        let cli = GitCli::new();
        assert!(!cli.has_local_changes(&ws).await.unwrap());

        let store = JobStateStore::open(Config::default().state_path_for(&ws)).unwrap();
        store
            .set_job_id(
                &TestIdentity::new(Some(ws.join("kontrol.toml")), "default"),
                "job-1",
            )
            .unwrap();

        assert!(store.path().exists());
        assert!(!cli.has_local_changes(&ws).await.unwrap());
    }
}
