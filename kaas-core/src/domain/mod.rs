//! Core domain types
//!
//! This module contains the core domain structures used across the KaaS crates.
//! Job records mirror what the remote service reports; the test tree and run
//! kinds describe what was discovered locally and how it is submitted.

pub mod job;
pub mod org;
