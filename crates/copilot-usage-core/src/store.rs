//! Object storage and series publishing.
//!
//! Artifacts are whole-object JSON documents: a run reads the previous
//! object once, merges in memory, and overwrites the object with the
//! superset. Read problems degrade to an empty series so a fresh bucket
//! (or a corrupt object) bootstraps instead of aborting the run.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("object not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Key-value object storage with get/put semantics.
pub trait ObjectStore {
    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError>;
    fn put(&self, key: &str, body: &[u8]) -> Result<(), StoreError>;
}

/// A directory acting as the bucket, one file per key.
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

impl ObjectStore for FsStore {
    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        match std::fs::read(self.root.join(key)) {
            Ok(body) => Ok(body),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(key.to_owned()))
            }
            Err(err) => Err(StoreError::Io(err)),
        }
    }

    fn put(&self, key: &str, body: &[u8]) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::write(self.root.join(key), body)?;
        Ok(())
    }
}

/// Read a stored series, falling back to empty when the object is missing
/// or unreadable. Only the missing case is expected; anything else is
/// logged as an error before the fallback.
pub fn read_series<T: DeserializeOwned>(store: &impl ObjectStore, key: &str) -> Vec<T> {
    let body = match store.get(key) {
        Ok(body) => body,
        Err(StoreError::NotFound(_)) => {
            info!(key, "no stored object found, starting with an empty series");
            return Vec::new();
        }
        Err(err) => {
            error!(key, error = %err, "error reading stored object, using an empty series");
            return Vec::new();
        }
    };

    match serde_json::from_slice(&body) {
        Ok(series) => series,
        Err(err) => {
            error!(key, error = %err, "error decoding stored object, using an empty series");
            Vec::new()
        }
    }
}

/// Overwrite a stored object with the serialized series.
///
/// Returns false on failure so one artifact's write problem never blocks
/// the rest of the run.
pub fn write_series<T: Serialize>(store: &impl ObjectStore, key: &str, series: &T) -> bool {
    let body = match to_pretty_json(series) {
        Ok(body) => body,
        Err(err) => {
            error!(key, error = %err, "failed to serialize series");
            return false;
        }
    };

    match store.put(key, &body) {
        Ok(()) => {
            info!(key, "successfully updated stored object");
            true
        }
        Err(err) => {
            error!(key, error = %err, "failed to update stored object");
            false
        }
    }
}

// Stored artifacts use 4-space indentation.
fn to_pretty_json<T: Serialize>(value: &T) -> serde_json::Result<Vec<u8>> {
    let mut body = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut body, formatter);
    value.serialize(&mut serializer)?;
    Ok(body)
}
