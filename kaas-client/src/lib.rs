//! KaaS HTTP Client
//!
//! A simple, type-safe HTTP client for the KaaS (K as a Service) REST API.
//!
//! The client covers the endpoints the proof runner needs: submitting jobs,
//! querying job status and reports, and inspecting organizations and vaults.
//!
//! # Example
//!
//! ```no_run
//! use kaas_client::KaasClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = KaasClient::new("https://kaas.runtimeverification.com", "my-api-key");
//!
//!     let job = client.get_job("6f1c2a").await?;
//!     println!("Job {} is {}", job.id, job.status);
//!     Ok(())
//! }
//! ```

pub mod error;
mod jobs;
mod links;
mod orgs;

// Re-export commonly used types
pub use error::{ClientError, Result};

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

/// Upper bound for a single request made by [`KaasClient::new`]
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the KaaS API
///
/// This client provides methods for the KaaS API endpoints, organized
/// into logical groups:
/// - Job lifecycle (submit, status, JSON report)
/// - Organization and vault lookup (list, get, link)
/// - Web links into the KaaS app for jobs, reports and caches
#[derive(Debug, Clone)]
pub struct KaasClient {
    /// Base URL of the service (e.g., "https://kaas.runtimeverification.com")
    base_url: String,
    /// Bearer token sent with every request
    api_key: String,
    /// HTTP client instance
    client: Client,
}

impl KaasClient {
    /// Create a new KaaS client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the KaaS service
    /// * `api_key` - The personal access token used as bearer auth
    ///
    /// # Example
    /// ```
    /// use kaas_client::KaasClient;
    ///
    /// let client = KaasClient::new("https://kaas.runtimeverification.com", "token");
    /// ```
    ///
    /// Requests time out after [`DEFAULT_TIMEOUT`]; a stalled connection then
    /// surfaces as a transient [`ClientError::RequestFailed`].
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self::with_client(base_url, api_key, client)
    }

    /// Create a new KaaS client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Example
    /// ```
    /// use kaas_client::KaasClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(30))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = KaasClient::with_client("https://kaas.runtimeverification.com", "token", http_client);
    /// ```
    pub fn with_client(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        client: Client,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Get the base URL of the service
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds an endpoint URL from path segments, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ClientError::InvalidRequest(format!("Invalid base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidRequest("Base URL cannot be a base for endpoints".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn get(&self, segments: &[&str]) -> Result<RequestBuilder> {
        Ok(self.authorize(self.client.get(self.endpoint(segments)?)))
    }

    fn post(&self, segments: &[&str]) -> Result<RequestBuilder> {
        Ok(self.authorize(self.client.post(self.endpoint(segments)?)))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        if self.api_key.is_empty() {
            request
        } else {
            request.bearer_auth(&self.api_key)
        }
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// This method checks the status code and returns an appropriate error if
    /// the request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}
