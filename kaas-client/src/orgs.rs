//! Account, organization and vault API endpoints

use crate::KaasClient;
use crate::error::Result;
use kaas_core::domain::org::{Organization, Vault};

impl KaasClient {
    // =============================================================================
    // Account
    // =============================================================================

    /// Get the account the token belongs to
    ///
    /// Fails with a 401 [`crate::ClientError::ApiError`] for an invalid token.
    pub async fn get_current_user(&self) -> Result<serde_json::Value> {
        let response = self.get(&["api", "user"])?.send().await?;

        self.handle_response(response).await
    }

    // =============================================================================
    // Organizations
    // =============================================================================

    /// List the organizations visible to the current token
    pub async fn list_organizations(&self) -> Result<Vec<Organization>> {
        let response = self.get(&["api", "orgs"])?.send().await?;

        self.handle_response(response).await
    }

    // =============================================================================
    // Vaults
    // =============================================================================

    /// List the vaults of an organization
    ///
    /// # Arguments
    /// * `organization` - The organization name
    pub async fn list_vaults(&self, organization: &str) -> Result<Vec<Vault>> {
        let response = self
            .get(&["api", "orgs", organization, "vaults"])?
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get a single vault
    ///
    /// # Arguments
    /// * `organization` - The organization name
    /// * `vault` - The vault name
    ///
    /// # Returns
    /// The vault, or an error for which [`crate::ClientError::is_not_found`]
    /// holds when the repository is not linked yet
    pub async fn get_vault(&self, organization: &str, vault: &str) -> Result<Vault> {
        let response = self
            .get(&["api", "orgs", organization, "vaults", vault])?
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Link a repository into an organization as a new vault
    ///
    /// # Arguments
    /// * `organization` - The organization name
    /// * `vault` - The repository name to link
    pub async fn link_vault(&self, organization: &str, vault: &str) -> Result<Vault> {
        let response = self
            .post(&["api", "orgs", organization, "vaults", vault])?
            .send()
            .await?;

        self.handle_response(response).await
    }
}
