//! Data Transfer Objects for the KaaS REST API
//!
//! Request and response bodies that only exist on the wire. Records that are
//! also used as domain values (jobs, organizations, vaults) live in `domain`.

pub mod job;
