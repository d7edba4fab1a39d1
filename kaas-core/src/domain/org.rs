//! Organization and vault domain model
//!
//! Organizations are the GitHub owners the KaaS app is installed for; a vault
//! is a repository linked into an organization.

use serde::{Deserialize, Serialize};

/// Organization summary returned by `GET /api/orgs`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Vault summary returned by the vault endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vault {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_name: Option<String>,
}

impl std::fmt::Display for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.organization_name {
            Some(org) => write!(f, "{}/{}", org, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}
