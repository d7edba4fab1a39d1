//! Repository layer
//!
//! Repositories are thin, stateless seams over the KaaS API. They provide
//! focused interfaces for the operations the runner needs without any
//! business logic.
//!
//! All repositories are trait-based to enable testing and mocking; the
//! production implementation is [`kaas_client::KaasClient`].

mod jobs;
mod vaults;

// Re-export traits
pub use jobs::JobRepository;
pub use vaults::VaultRepository;

/// Everything a test run needs from the service
pub trait KaasApi: JobRepository + VaultRepository {}

impl<T> KaasApi for T where T: JobRepository + VaultRepository {}
