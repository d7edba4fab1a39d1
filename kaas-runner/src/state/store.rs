//! Job id store
//!
//! A JSON document mapping `TestIdentity` keys to job ids, stored per workspace.
//! Every mutation is written through to disk before the call returns.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use kaas_core::domain::test::TestIdentity;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors reading or persisting the state document
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Failed to read job state from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Job state in {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to persist job state to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

type Entries = BTreeMap<String, String>;

/// Durable mapping from test identity to the last submitted job id
///
/// Internally synchronized; share it behind an `Arc`.
#[derive(Debug)]
pub struct JobStateStore {
    path: PathBuf,
    entries: Mutex<Entries>,
}

impl JobStateStore {
    /// Opens the store, loading the document if it already exists
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StateError> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => Entries::new(),
            Ok(content) => {
                serde_json::from_str(&content).map_err(|source| StateError::Corrupt {
                    path: path.clone(),
                    source,
                })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Entries::new(),
            Err(source) => {
                return Err(StateError::Read {
                    path: path.clone(),
                    source,
                });
            }
        };

        debug!("Loaded {} job id(s) from {}", entries.len(), path.display());

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Path of the backing document
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records `job_id` as the active job for `identity`, replacing any previous one
    pub fn set_job_id(&self, identity: &TestIdentity, job_id: &str) -> Result<(), StateError> {
        let mut entries = self.lock();
        let key = identity.key();
        let previous = entries.insert(key.clone(), job_id.to_string());

        if let Err(e) = self.persist(&entries) {
            // Keep memory consistent with what is on disk.
            match previous {
                Some(old) => entries.insert(key, old),
                None => entries.remove(&key),
            };
            return Err(e);
        }

        if let Some(old) = previous.filter(|old| old != job_id) {
            debug!("Job {} for {} superseded by {}", old, identity, job_id);
        }
        Ok(())
    }

    /// Returns the active job id for `identity`, if any
    pub fn get_job_id(&self, identity: &TestIdentity) -> Option<String> {
        self.lock().get(&identity.key()).cloned()
    }

    /// Forgets the job tracked for `identity`, returning it
    pub fn clear_job_id(&self, identity: &TestIdentity) -> Result<Option<String>, StateError> {
        self.clear_key(&identity.key())
    }

    /// Forgets the job tracked under a raw document key
    pub fn clear_key(&self, key: &str) -> Result<Option<String>, StateError> {
        let mut entries = self.lock();
        let Some(removed) = entries.remove(key) else {
            return Ok(None);
        };

        if let Err(e) = self.persist(&entries) {
            entries.insert(key.to_string(), removed);
            return Err(e);
        }
        Ok(Some(removed))
    }

    /// Forgets every tracked job
    pub fn clear_all(&self) -> Result<usize, StateError> {
        let mut entries = self.lock();
        let removed = std::mem::take(&mut *entries);

        if let Err(e) = self.persist(&entries) {
            *entries = removed;
            return Err(e);
        }
        Ok(removed.len())
    }

    /// Snapshot of every `(key, job id)` pair
    pub fn entries(&self) -> Vec<(String, String)> {
        self.lock()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        // A panic while holding the lock cannot leave the map half-written.
        self.entries.lock().unwrap_or_else(|poisoned| {
            warn!("Job state lock was poisoned, continuing");
            poisoned.into_inner()
        })
    }

    /// Writes the document to a sibling temp file and renames it into place
    fn persist(&self, entries: &Entries) -> Result<(), StateError> {
        let write_err = |source| StateError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty() && !p.exists())
        {
            std::fs::create_dir_all(parent).map_err(write_err)?;
            // The default location is inside the checkout; keep it out of `git status`.
            std::fs::write(parent.join(".gitignore"), "*\n").map_err(write_err)?;
            debug!("Created state directory {}", parent.display());
        }

        let json = serde_json::to_vec_pretty(entries)
            .map_err(|e| write_err(std::io::Error::other(e)))?;

        let tmp = self.path.with_extension("json.tmp");
        let mut file = std::fs::File::create(&tmp).map_err(write_err)?;
        file.write_all(&json).map_err(write_err)?;
        file.sync_all().map_err(write_err)?;
        std::fs::rename(&tmp, &self.path).map_err(write_err)?;
        Ok(())
    }
}
