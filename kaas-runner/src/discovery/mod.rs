//! Test discovery
//!
//! Builds the test tree for a set of workspace folders from:
//! - `kontrol.toml` prove profiles
//! - `prove_` / `test_` functions in `test/**/*.t.sol`
//! - `foundry.toml` profiles (listed, not runnable)
//!
//! A folder whose config cannot be parsed is skipped and reported as a
//! [`RunError::Discovery`] warning; discovery itself never fails.

mod foundry;
mod kontrol;

use std::path::{Path, PathBuf};

use kaas_core::domain::test::{FOUNDRY_ROOT, KONTROL_ROOT, TestNode, gather_leaves};
use tracing::{debug, info, warn};

use crate::error::RunError;

pub use foundry::{FoundryTest, scan_test_source};
pub use kontrol::parse_kontrol_profiles;

/// Discovered test tree plus the folders that had to be skipped
#[derive(Debug, Default)]
pub struct Discovery {
    pub roots: Vec<TestNode>,
    pub warnings: Vec<RunError>,
}

impl Discovery {
    /// Runnable leaves of the whole tree
    pub fn leaves(&self) -> Vec<&TestNode> {
        gather_leaves(&self.roots)
    }

    /// Finds a node anywhere in the tree by id
    pub fn find(&self, id: &str) -> Option<&TestNode> {
        self.roots.iter().find_map(|root| root.find(id))
    }

    /// Leaves selected by node ids; every leaf when `ids` is empty
    ///
    /// Returns the ids that did not match any node alongside the leaves.
    pub fn select<'a>(&'a self, ids: &'a [String]) -> (Vec<&'a TestNode>, Vec<&'a str>) {
        if ids.is_empty() {
            return (self.leaves(), Vec::new());
        }

        let mut leaves = Vec::new();
        let mut unknown = Vec::new();
        for id in ids {
            match self.find(id) {
                Some(node) => node.gather_leaf_tests(&mut leaves),
                None => unknown.push(id.as_str()),
            }
        }
        (leaves, unknown)
    }
}

/// Absolute form of a workspace folder
///
/// Test identities embed file paths, so `.` and `/abs/repo` must resolve to
/// the same key.
pub fn resolve_folder(folder: &Path) -> PathBuf {
    std::fs::canonicalize(folder).unwrap_or_else(|e| {
        debug!("Could not canonicalize {}: {}", folder.display(), e);
        folder.to_path_buf()
    })
}

/// Discovers tests in every folder
pub fn discover_workspace(folders: &[PathBuf]) -> Discovery {
    let mut discovery = Discovery::default();
    let mut kontrol_root = TestNode::group(KONTROL_ROOT, "Kontrol");
    let mut foundry_root = TestNode::group(FOUNDRY_ROOT, "Foundry");

    for folder in folders {
        let folder = &resolve_folder(folder);
        let tests = match foundry::discover_tests(folder) {
            Ok(tests) => tests,
            Err(e) => {
                warn!("{}", e);
                discovery.warnings.push(e);
                Vec::new()
            }
        };

        if let Err(e) = kontrol::discover(folder, &tests, &mut kontrol_root) {
            warn!("Skipping Kontrol profiles: {}", e);
            discovery.warnings.push(e);
        }

        foundry::populate_tests(&tests, &mut foundry_root);

        if let Err(e) = foundry::discover_profiles(folder, &mut foundry_root) {
            warn!("Skipping Foundry profiles: {}", e);
            discovery.warnings.push(e);
        }
    }

    for root in [kontrol_root, foundry_root] {
        if !root.children.is_empty() {
            discovery.roots.push(root);
        }
    }

    info!(
        "Discovered {} runnable test(s) in {} folder(s)",
        discovery.leaves().len(),
        folders.len()
    );
    discovery
}

/// Reads a file that may legitimately be absent
fn read_optional(path: &Path) -> Result<Option<String>, RunError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(RunError::discovery(path, e.to_string())),
    }
}
