//! Child job matching
//!
//! A submission with several profiles comes back as a parent job with one
//! child per profile. Each test is reported from the child it corresponds to.

use kaas_core::domain::job::JobRecord;
use kaas_core::domain::test::{RunKind, TestCase};
use kaas_core::dto::job::ProveProfile;

/// A test together with the profile it was submitted as
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollTarget {
    pub test: TestCase,
    pub profile: ProveProfile,
}

impl PollTarget {
    pub fn new(test: TestCase, profile: ProveProfile) -> Self {
        Self { test, profile }
    }

    /// Target for a test submitted on its own, using its first profile
    pub fn for_test(test: TestCase) -> Option<Self> {
        let profile = test.run.as_ref()?.profiles().into_iter().next()?;
        Some(Self::new(test, profile))
    }

    fn match_test(&self) -> Option<String> {
        self.test.run.as_ref().and_then(RunKind::match_test)
    }
}

/// Picks the record that reports on `target`
///
/// Tried in order:
/// 1. a child whose structured `matchTest` equals the test selector
/// 2. a child with the submitted profile name and identical arguments
/// 3. a child whose arguments contain the submitted arguments, or the
///    submitted profile name when there are no arguments
///
/// Falls back to the parent when nothing matches. Step 3 depends on how the
/// service echoes arguments back and only exists for older records.
pub fn select_record<'a>(job: &'a JobRecord, target: &PollTarget) -> &'a JobRecord {
    if job.children.is_empty() {
        return job;
    }

    if let Some(selector) = target.match_test() {
        if let Some(child) = job
            .children
            .iter()
            .find(|c| c.match_test.as_deref() == Some(selector.as_str()))
        {
            return child;
        }
    }

    let profile_name = target.profile.profile_name.as_str();
    let args = target.profile.extra_prove_args.trim();

    if let Some(child) = job.children.iter().find(|c| {
        c.profile_name.as_deref() == Some(profile_name)
            && c.extra_prove_args.as_deref().unwrap_or("").trim() == args
    }) {
        return child;
    }

    let needle = if args.is_empty() { profile_name } else { args };
    job.children
        .iter()
        .find(|c| c.extra_prove_args.as_deref().is_some_and(|a| a.contains(needle)))
        .unwrap_or(job)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kaas_core::domain::job::{JobKind, JobStatus};
    use kaas_core::domain::test::{KontrolRun, TestIdentity};

    fn record(id: &str, profile: Option<&str>, args: Option<&str>) -> JobRecord {
        JobRecord {
            id: id.to_string(),
            status: JobStatus::Success,
            duration: 1.0,
            kind: JobKind::Kontrol,
            organization_name: "acme".to_string(),
            vault_name: "proofs".to_string(),
            cache_hash: None,
            profile_name: profile.map(str::to_string),
            extra_prove_args: args.map(str::to_string),
            match_test: None,
            children: Vec::new(),
        }
    }

    fn kontrol_test(test: &str) -> TestCase {
        TestCase {
            identity: TestIdentity::new(None, test),
            label: test.to_string(),
            run: Some(RunKind::Kontrol(KontrolRun::Test {
                test: test.to_string(),
            })),
        }
    }

    fn kontrol_profile(profile: &str) -> TestCase {
        TestCase {
            identity: TestIdentity::new(None, profile),
            label: profile.to_string(),
            run: Some(RunKind::Kontrol(KontrolRun::Profile {
                profile: profile.to_string(),
            })),
        }
    }

    #[test]
    fn test_quoted_args_select_child_over_parent() {
        let mut parent = record("parent", None, None);
        parent
            .children
            .push(record("child", Some("default"), Some("--match-test \"Foo(\"")));

        let target = PollTarget::new(
            kontrol_test("Foo("),
            ProveProfile::new("default", "--match-test \"Foo(\""),
        );

        assert_eq!(select_record(&parent, &target).id, "child");
    }

    #[test]
    fn test_structured_match_wins() {
        let mut parent = record("parent", None, None);
        parent
            .children
            .push(record("by-args", Some("default"), Some("--match-test C.prove_a")));
        let mut structured = record("by-field", Some("default"), Some("unrelated"));
        structured.match_test = Some("C.prove_a".to_string());
        parent.children.push(structured);

        let target = PollTarget::for_test(kontrol_test("C.prove_a")).unwrap();
        assert_eq!(select_record(&parent, &target).id, "by-field");
    }

    #[test]
    fn test_children_distinguished_by_args() {
        let mut parent = record("parent", None, None);
        parent
            .children
            .push(record("a", Some("default"), Some("--match-test C.prove_a")));
        parent
            .children
            .push(record("b", Some("default"), Some("--match-test C.prove_b")));

        let target = PollTarget::for_test(kontrol_test("C.prove_b")).unwrap();
        assert_eq!(select_record(&parent, &target).id, "b");
    }

    #[test]
    fn test_legacy_substring_match() {
        let mut parent = record("parent", None, None);
        parent.children.push(record(
            "child",
            None,
            Some("--verbose --match-test C.prove_a --bmc-depth 3"),
        ));

        let target = PollTarget::for_test(kontrol_test("C.prove_a")).unwrap();
        assert_eq!(select_record(&parent, &target).id, "child");
    }

    #[test]
    fn test_profile_run_matches_by_name() {
        let mut parent = record("parent", None, None);
        parent.children.push(record("fast", Some("fast"), None));
        parent.children.push(record("slow", Some("slow"), Some("")));

        let target = PollTarget::for_test(kontrol_profile("slow")).unwrap();
        assert_eq!(select_record(&parent, &target).id, "slow");
    }

    #[test]
    fn test_legacy_profile_name_in_args() {
        let mut parent = record("parent", None, None);
        parent
            .children
            .push(record("other", None, Some("--profile other")));
        parent
            .children
            .push(record("child", None, Some("--profile slow --verbose")));

        let target = PollTarget::for_test(kontrol_profile("slow")).unwrap();
        assert_eq!(select_record(&parent, &target).id, "child");
    }

    #[test]
    fn test_falls_back_to_parent() {
        let mut parent = record("parent", None, None);
        parent
            .children
            .push(record("other", Some("other"), Some("--match-test X")));

        let target = PollTarget::for_test(kontrol_profile("default")).unwrap();
        assert_eq!(select_record(&parent, &target).id, "parent");

        let lone = record("lone", None, None);
        assert_eq!(select_record(&lone, &target).id, "lone");
    }

    #[test]
    fn test_ambiguous_profile_name_falls_back_to_parent() {
        let mut parent = record("parent", None, None);
        parent
            .children
            .push(record("a", Some("default"), Some("--match-test A")));
        parent
            .children
            .push(record("b", Some("default"), Some("--match-test B")));

        let target = PollTarget::new(
            kontrol_profile("default"),
            ProveProfile::new("default", "--match-test C"),
        );
        assert_eq!(select_record(&parent, &target).id, "parent");
    }

    #[test]
    fn test_target_requires_run_kind() {
        let test = TestCase {
            identity: TestIdentity::new(None, "orphan"),
            label: "orphan".to_string(),
            run: None,
        };
        assert!(PollTarget::for_test(test).is_none());
    }
}
