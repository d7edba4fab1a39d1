//! Kontrol discovery from `kontrol.toml`

use std::path::Path;

use kaas_core::domain::test::{
    KONTROL_PROVE_GROUP, KONTROL_TESTS_GROUP, KontrolRun, RunKind, TestNode,
};
use serde::Deserialize;
use tracing::debug;

use super::foundry::FoundryTest;
use super::read_optional;
use crate::error::RunError;

const KONTROL_TOML: &str = "kontrol.toml";

#[derive(Debug, Deserialize)]
struct KontrolToml {
    #[serde(default)]
    prove: toml::Table,
}

/// Names of the `[prove.<name>]` profiles in a `kontrol.toml` document
pub fn parse_kontrol_profiles(content: &str) -> Result<Vec<String>, toml::de::Error> {
    let parsed: KontrolToml = toml::from_str(content)?;
    Ok(parsed
        .prove
        .into_iter()
        .filter(|(_, profile)| profile.is_table())
        .map(|(name, _)| name)
        .collect())
}

/// Adds the folder's prove profiles and `prove_` tests under the Kontrol root
pub(super) fn discover(
    folder: &Path,
    tests: &[FoundryTest],
    root: &mut TestNode,
) -> Result<(), RunError> {
    let path = folder.join(KONTROL_TOML);
    let Some(content) = read_optional(&path)? else {
        return Ok(());
    };

    let profiles =
        parse_kontrol_profiles(&content).map_err(|e| RunError::discovery(&path, e.to_string()))?;
    debug!("Found {} prove profile(s) in {}", profiles.len(), path.display());

    if !profiles.is_empty() {
        let prove = root.ensure_group(KONTROL_PROVE_GROUP, "Prove profiles");
        for profile in profiles {
            prove.children.push(TestNode::leaf(
                profile.clone(),
                &path,
                RunKind::Kontrol(KontrolRun::Profile { profile }),
            ));
        }
    }

    let proofs: Vec<_> = tests.iter().filter(|t| t.is_proof()).collect();
    if proofs.is_empty() {
        return Ok(());
    }

    // Single proofs run through this folder's kontrol.toml, so they are keyed by it.
    let group = root.ensure_group(KONTROL_TESTS_GROUP, "Proofs");
    for test in proofs {
        let name = test.qualified_name();
        group.children.push(
            TestNode::leaf(
                name.clone(),
                &path,
                RunKind::Kontrol(KontrolRun::Test { test: name }),
            )
            .with_description(test.file.display().to_string()),
        );
    }
    Ok(())
}
