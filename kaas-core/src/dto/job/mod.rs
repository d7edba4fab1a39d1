//! Job DTOs for the KaaS REST API

use serde::{Deserialize, Serialize};

use crate::domain::job::JobKind;

/// Kontrol image used for Foundry submissions
pub const DEFAULT_KONTROL_DOCKER_IMAGE: &str = "runtimeverification/kontrol:ubuntu-jammy-latest";

/// One named profile inside a job submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProveProfile {
    pub profile_name: String,
    pub extra_prove_args: String,
    pub tag: String,
}

impl ProveProfile {
    pub fn new(profile_name: impl Into<String>, extra_prove_args: impl Into<String>) -> Self {
        Self {
            profile_name: profile_name.into(),
            extra_prove_args: extra_prove_args.into(),
            tag: "latest".to_string(),
        }
    }
}

/// Request body for `POST /api/orgs/{org}/vaults/{vault}/jobs`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJob {
    pub branch: String,
    pub kind: JobKind,
    pub kontrol_version: String,
    pub kontrol_docker_image: String,
    pub kaas_cli_branch: String,
    pub extra_build_args: String,
    pub foundry_profile: String,
    pub profiles: Vec<ProveProfile>,
    pub workflow_branch: String,
    pub kaas_server_url: String,
}

impl CreateJob {
    /// Builds a submission with the service's default workflow settings
    pub fn new(
        kind: JobKind,
        branch: impl Into<String>,
        profiles: Vec<ProveProfile>,
        kaas_server_url: impl Into<String>,
    ) -> Self {
        let (kontrol_version, kontrol_docker_image) = match kind {
            JobKind::Kontrol => (String::new(), String::new()),
            JobKind::Foundry => (
                "latest".to_string(),
                DEFAULT_KONTROL_DOCKER_IMAGE.to_string(),
            ),
        };
        Self {
            branch: branch.into(),
            kind,
            kontrol_version,
            kontrol_docker_image,
            kaas_cli_branch: "master".to_string(),
            extra_build_args: String::new(),
            foundry_profile: "default".to_string(),
            profiles,
            workflow_branch: "main".to_string(),
            kaas_server_url: kaas_server_url.into(),
        }
    }
}

/// Response body of a successful job submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobCreated {
    pub job_id: String,
}
