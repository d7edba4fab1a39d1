//! Persisted job state
//!
//! Keeps the correlation between local tests and remote job ids so that a
//! later session can resume tracking jobs it did not submit itself.

mod store;

pub use store::{JobStateStore, StateError};
