//! File-backed fallback store.
//!
//! Each key maps to one JSON array blob at `{dir}/{key}.json`. A missing or
//! unreadable blob reads as an empty list.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::error::StoreError;

/// Blob holding generated reports.
pub const REPORTS_KEY: &str = "advanced_reports";

/// Blob holding saved report templates.
pub const TEMPLATES_KEY: &str = "report_templates";

pub struct LocalStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl LocalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Reads the list stored under `key`.
    pub async fn load<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let path = self.path_for(key);
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!(key = key, error = %e, "Failed to read local store blob");
                return Vec::new();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(
                    key = key,
                    error = %e,
                    "Malformed local store blob, treating as empty"
                );
                Vec::new()
            }
        }
    }

    /// Applies `f` to the list under `key` and writes the result back.
    ///
    /// Read-modify-write cycles are serialized within the process.
    pub async fn update<T, R, F>(&self, key: &str, f: F) -> Result<R, StoreError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut Vec<T>) -> R,
    {
        let _guard = self.write_lock.lock().await;
        let mut items = self.load(key).await;
        let result = f(&mut items);
        self.write(key, &items).await?;
        Ok(result)
    }

    async fn write<T: Serialize>(&self, key: &str, items: &[T]) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(key);
        let tmp = self.dir.join(format!("{}.json.tmp", key));
        let contents = serde_json::to_vec(items)?;

        tokio::fs::write(&tmp, contents).await?;
        tokio::fs::rename(&tmp, &path).await?;

        tracing::debug!(key = key, items = items.len(), "Local store blob written");
        Ok(())
    }
}
