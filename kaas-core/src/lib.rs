//! KaaS Core
//!
//! Core types and abstractions for the KaaS proof runner.
//!
//! This crate contains:
//! - Domain types: Core business entities (JobRecord, test tree, run kinds)
//! - DTOs: Data transfer objects for the KaaS REST API

pub mod domain;
pub mod dto;
