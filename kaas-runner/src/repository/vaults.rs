//! Vaults repository
//!
//! Token, organization and vault lookups used to validate a workspace before submitting.

use async_trait::async_trait;
use kaas_client::{KaasClient, Result};
use kaas_core::domain::org::{Organization, Vault};

/// Repository trait for organization and vault operations with KaaS
#[async_trait]
pub trait VaultRepository: Send + Sync {
    /// Fetches the account of the current token; fails when the token is invalid
    async fn get_current_user(&self) -> Result<serde_json::Value>;

    /// Lists the organizations visible to the current token
    async fn list_organizations(&self) -> Result<Vec<Organization>>;

    /// Fetches a vault; a missing vault is a not-found error
    async fn get_vault(&self, organization: &str, vault: &str) -> Result<Vault>;

    /// Links a repository into the organization as a vault
    async fn link_vault(&self, organization: &str, vault: &str) -> Result<Vault>;
}

#[async_trait]
impl VaultRepository for KaasClient {
    async fn get_current_user(&self) -> Result<serde_json::Value> {
        KaasClient::get_current_user(self).await
    }

    async fn list_organizations(&self) -> Result<Vec<Organization>> {
        KaasClient::list_organizations(self).await
    }

    async fn get_vault(&self, organization: &str, vault: &str) -> Result<Vault> {
        KaasClient::get_vault(self, organization, vault).await
    }

    async fn link_vault(&self, organization: &str, vault: &str) -> Result<Vault> {
        KaasClient::link_vault(self, organization, vault).await
    }
}
