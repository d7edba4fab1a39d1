//! Foundry discovery from `test/**/*.t.sol` and `foundry.toml`

use std::path::{Path, PathBuf};

use kaas_core::domain::test::{FOUNDRY_PROFILES_GROUP, FoundryRun, RunKind, TestNode};
use serde::Deserialize;

use super::read_optional;
use crate::error::RunError;

const TEST_DIR: &str = "test";
const TEST_SUFFIX: &str = ".t.sol";
const FOUNDRY_TOML: &str = "foundry.toml";

/// A `test_` or `prove_` function found in a test source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundryTest {
    pub file: PathBuf,
    pub contract: String,
    pub function: String,
}

impl FoundryTest {
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.contract, self.function)
    }

    /// Symbolic proofs are the `prove_` functions
    pub fn is_proof(&self) -> bool {
        self.function.starts_with("prove_")
    }
}

/// Finds test functions in every `test/**/*.t.sol` file of a folder
pub(super) fn discover_tests(folder: &Path) -> Result<Vec<FoundryTest>, RunError> {
    let test_dir = folder.join(TEST_DIR);
    if !test_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut sources = Vec::new();
    collect_sources(&test_dir, &mut sources)
        .map_err(|e| RunError::discovery(&test_dir, e.to_string()))?;
    sources.sort();

    let mut tests = Vec::new();
    for file in sources {
        let content =
            std::fs::read_to_string(&file).map_err(|e| RunError::discovery(&file, e.to_string()))?;
        let fallback = file
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.strip_suffix(TEST_SUFFIX))
            .unwrap_or_default()
            .to_string();

        for (contract, function) in scan_test_source(&content) {
            tests.push(FoundryTest {
                file: file.clone(),
                contract: contract.unwrap_or_else(|| fallback.clone()),
                function,
            });
        }
    }
    Ok(tests)
}

fn collect_sources(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_sources(&path, out)?;
        } else if path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(TEST_SUFFIX))
        {
            out.push(path);
        }
    }
    Ok(())
}

/// Lists `(enclosing contract, function)` for each test function in a source
///
/// Test functions are `function test_*(` and `function prove_*(`. The
/// contract is the closest preceding `contract` declaration.
pub fn scan_test_source(source: &str) -> Vec<(Option<String>, String)> {
    let words = identifiers(source);
    let mut contract: Option<String> = None;
    let mut found = Vec::new();

    for pair in words.windows(2) {
        let (_, keyword) = pair[0];
        let (end, name) = pair[1];
        match keyword {
            "contract" => contract = Some(name.to_string()),
            "function" if is_test_name(name) => {
                if source[end..].trim_start().starts_with('(') {
                    found.push((contract.clone(), name.to_string()));
                }
            }
            _ => {}
        }
    }
    found
}

fn is_test_name(name: &str) -> bool {
    ["test_", "prove_"]
        .iter()
        .any(|prefix| name.strip_prefix(prefix).is_some_and(|rest| !rest.is_empty()))
}

/// Identifier-like words with the byte offset just past each one
///
/// `//` and `/* */` comments are skipped.
fn identifiers(source: &str) -> Vec<(usize, &str)> {
    let bytes = source.as_bytes();
    let is_ident = |b: u8| b.is_ascii_alphanumeric() || b == b'_' || b == b'$';
    let mut words = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let rest = &bytes[i..];
        if rest.starts_with(b"//") {
            i = source[i..].find('\n').map_or(bytes.len(), |n| i + n);
        } else if rest.starts_with(b"/*") {
            i = source[i + 2..].find("*/").map_or(bytes.len(), |n| i + n + 4);
        } else if is_ident(bytes[i]) {
            let start = i;
            while i < bytes.len() && is_ident(bytes[i]) {
                i += 1;
            }
            words.push((i, &source[start..i]));
        } else {
            i += 1;
        }
    }
    words
}

/// Groups test functions by contract under the Foundry root
pub(super) fn populate_tests(tests: &[FoundryTest], root: &mut TestNode) {
    for test in tests {
        let group = root.ensure_group(&test.contract, &test.contract);
        if group.description.is_none() {
            group.description = Some(test.file.display().to_string());
        }
        group.children.push(
            TestNode::leaf(
                test.qualified_name(),
                &test.file,
                RunKind::Foundry(FoundryRun {
                    contract: test.contract.clone(),
                    test: test.function.clone(),
                }),
            )
            .with_label(test.function.clone()),
        );
    }
}

#[derive(Debug, Deserialize)]
struct FoundryToml {
    #[serde(default)]
    profile: toml::Table,
}

/// Lists `foundry.toml` profiles; they cannot be submitted on their own
pub(super) fn discover_profiles(folder: &Path, root: &mut TestNode) -> Result<(), RunError> {
    let path = folder.join(FOUNDRY_TOML);
    let Some(content) = read_optional(&path)? else {
        return Ok(());
    };

    let parsed: FoundryToml =
        toml::from_str(&content).map_err(|e| RunError::discovery(&path, e.to_string()))?;
    if parsed.profile.is_empty() {
        return Ok(());
    }

    let group = root.ensure_group(FOUNDRY_PROFILES_GROUP, "Profiles");
    for name in parsed.profile.keys() {
        group.children.push(
            TestNode::group(format!("foundry:{}", name), name.clone())
                .with_description(path.display().to_string()),
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_finds_test_and_prove_functions() {
        let source = r#"
contract Helper {
    function test_helper_is_not_skipped() internal {}
}

contract VaultTest is Test {
    // function test_commented
    // function test_disabled() public {}
    /* function prove_disabled(uint256 x) public {}
       contract Nested {} */
    function testFuzz_Legacy(uint256) public {}
    function test_deposit() public {}
    function prove_withdraw (uint256 amount) public {}
    function test_ (uint256) public {}
    function setUp() public {}
}
"#;
        let found = scan_test_source(source);
        assert_eq!(
            found,
            vec![
                (
                    Some("Helper".to_string()),
                    "test_helper_is_not_skipped".to_string()
                ),
                (Some("VaultTest".to_string()), "test_deposit".to_string()),
                (Some("VaultTest".to_string()), "prove_withdraw".to_string()),
            ]
        );
    }

    #[test]
    fn test_contract_falls_back_to_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("test")).unwrap();
        std::fs::write(
            dir.path().join("test/Free.t.sol"),
            "function test_free() {}\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("test/Ignored.sol"), "function test_x() {}\n").unwrap();

        let tests = discover_tests(dir.path()).unwrap();
        assert_eq!(tests.len(), 1);
        assert_eq!(tests[0].contract, "Free");
        assert_eq!(tests[0].qualified_name(), "Free.test_free");
        assert!(!tests[0].is_proof());
    }

    #[test]
    fn test_profiles_are_not_runnable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("foundry.toml"),
            "[profile.default]\nsrc = \"src\"\n[profile.lite]\noptimizer = false\n",
        )
        .unwrap();

        let mut root = TestNode::group("foundry", "Foundry");
        discover_profiles(dir.path(), &mut root).unwrap();

        let group = root.find(FOUNDRY_PROFILES_GROUP).unwrap();
        assert_eq!(group.children.len(), 2);
        assert!(group.children.iter().all(|p| !p.is_leaf() && p.run.is_none()));
    }

    #[test]
    fn test_malformed_foundry_toml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("foundry.toml"), "[profile\n").unwrap();
        let mut root = TestNode::group("foundry", "Foundry");
        assert!(matches!(
            discover_profiles(dir.path(), &mut root),
            Err(RunError::Discovery { .. })
        ));
    }
}
