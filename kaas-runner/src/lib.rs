//! KaaS Runner
//!
//! Drives proof and test runs against the KaaS service.
//!
//! Architecture:
//! - Configuration: Service, polling and state settings with defaults
//! - Discovery: Build the test tree from `kontrol.toml`, `foundry.toml` and test sources
//! - State: Persist which remote job belongs to which test across sessions
//! - Repositories: Trait seams over the KaaS API and the local git checkout
//! - Scheduler: Poll submitted jobs until they reach a terminal status
//! - Services: Batch submission, pre-run validation, resume and workspace status
//!
//! Results flow out through a [`reporter::ResultReporter`], which any UI can implement.

pub mod config;
pub mod discovery;
pub mod error;
pub mod git;
pub mod reporter;
pub mod repository;
pub mod scheduler;
pub mod service;
pub mod state;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use error::{Result, RunError};
