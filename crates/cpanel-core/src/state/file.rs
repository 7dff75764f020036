// # File State Store
//
// JSON file implementation of StateStore.
//
// ## Purpose
//
// Keeps resource identifiers across process restarts. Losing this file means
// losing the only link between a declaration and its cPanel entity, so every
// mutation is written through before the call returns.
//
// ## Durability
//
// - Each write goes to `<name>.tmp` and is renamed over the state file
// - The previous state file is copied to `<name>.backup` before the rename
// - An unparseable state file is replaced by its backup on load
// - A state file that exists but cannot be read is an error, never "empty"
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "resources": {
//     "cpanel_zone_record.www": {
//       "resource_type": "cpanel_zone_record",
//       "id": "example.com:42",
//       "attributes": { "zone": "example.com", "name": "www", ... },
//       "last_updated": "2025-01-09T12:00:00Z"
//     }
//   }
// }
// ```
//
// Keys are written in sorted order so diffs of the file stay readable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

use crate::Error;
use crate::traits::state_store::{StateStore, TrackedResource};

const FORMAT_VERSION: &str = "1.0";

type Entries = BTreeMap<String, TrackedResource>;

/// On-disk document
#[derive(Debug, Default, Serialize, Deserialize)]
struct StateDocument {
    version: String,
    #[serde(default)]
    resources: Entries,
}

/// Result of reading one candidate file
enum Loaded {
    Entries(Entries),
    Missing,
    Corrupted(String),
}

/// File-backed state store
///
/// All mutations hold one lock across the in-memory change and the disk
/// write, so concurrent writers never interleave partial documents.
///
/// # Example
///
/// ```rust,no_run
/// use cpanel_core::state::FileStateStore;
/// use cpanel_core::traits::StateStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileStateStore::new("/var/lib/cpanelctl/state.json").await?;
///
///     for address in store.list().await? {
///         println!("{address}");
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileStateStore {
    path: PathBuf,
    entries: Mutex<Entries>,
}

impl FileStateStore {
    /// Open the store at `path`, creating parent directories as needed
    ///
    /// A missing file starts an empty store. A corrupted file is replaced by
    /// its backup when one parses; otherwise the store starts empty.
    ///
    /// # Errors
    ///
    /// - `Error::Config`: The parent directory cannot be created
    /// - `Error::StateStore`: The file exists but cannot be read
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::config(format!(
                    "cannot create state directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let entries = Self::recover(&path).await?;
        tracing::debug!(
            "Opened state file {} ({} tracked)",
            path.display(),
            entries.len()
        );

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn recover(path: &Path) -> Result<Entries, Error> {
        let reason = match read_document(path).await? {
            Loaded::Entries(entries) => return Ok(entries),
            Loaded::Missing => return Ok(Entries::new()),
            Loaded::Corrupted(reason) => reason,
        };

        let backup = sibling(path, "backup");
        tracing::warn!(
            "State file {} is corrupted ({}); trying {}",
            path.display(),
            reason,
            backup.display()
        );

        match read_document(&backup).await {
            Ok(Loaded::Entries(entries)) => {
                tracing::info!("Recovered {} tracked resources from backup", entries.len());
                if let Err(e) = fs::copy(&backup, path).await {
                    tracing::error!("Could not restore {} from backup: {}", path.display(), e);
                }
                Ok(entries)
            }
            Ok(Loaded::Missing) => {
                tracing::warn!("No backup available; starting with empty state");
                Ok(Entries::new())
            }
            Ok(Loaded::Corrupted(reason)) => {
                tracing::error!("Backup is unusable too ({}); starting with empty state", reason);
                Ok(Entries::new())
            }
            Err(e) => {
                tracing::error!("{}; starting with empty state", e);
                Ok(Entries::new())
            }
        }
    }

    /// Write `entries` through temp file, backup and rename
    async fn persist(&self, entries: &Entries) -> Result<(), Error> {
        let document = StateDocument {
            version: FORMAT_VERSION.to_string(),
            resources: entries.clone(),
        };
        let json = serde_json::to_vec_pretty(&document)
            .map_err(|e| Error::state_store(format!("cannot serialize state: {e}")))?;

        let temp = sibling(&self.path, "tmp");
        fs::write(&temp, &json).await.map_err(|e| {
            Error::state_store(format!("cannot write {}: {e}", temp.display()))
        })?;

        match fs::copy(&self.path, sibling(&self.path, "backup")).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Could not back up {}: {}", self.path.display(), e),
        }

        fs::rename(&temp, &self.path).await.map_err(|e| {
            Error::state_store(format!(
                "cannot move {} into place: {e}",
                temp.display()
            ))
        })?;

        tracing::trace!("Wrote {} tracked resources to {}", entries.len(), self.path.display());
        Ok(())
    }
}

async fn read_document(path: &Path) -> Result<Loaded, Error> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Loaded::Missing),
        Err(e) => {
            return Err(Error::state_store(format!(
                "cannot read {}: {e}",
                path.display()
            )));
        }
    };

    match serde_json::from_str::<StateDocument>(&content) {
        Ok(document) => {
            if document.version != FORMAT_VERSION {
                tracing::warn!(
                    "State file {} has version {}, expected {}; loading anyway",
                    path.display(),
                    document.version,
                    FORMAT_VERSION
                );
            }
            Ok(Loaded::Entries(document.resources))
        }
        Err(e) => Ok(Loaded::Corrupted(e.to_string())),
    }
}

/// `state.json` -> `state.<extension>`
fn sibling(path: &Path, extension: &str) -> PathBuf {
    path.with_extension(extension)
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn get(&self, address: &str) -> Result<Option<TrackedResource>, Error> {
        Ok(self.entries.lock().await.get(address).cloned())
    }

    async fn put(&self, address: &str, resource: &TrackedResource) -> Result<(), Error> {
        let mut entries = self.entries.lock().await;
        let previous = entries.insert(address.to_string(), resource.clone());

        if let Err(e) = self.persist(&entries).await {
            // Keep memory and disk in agreement
            match previous {
                Some(previous) => entries.insert(address.to_string(), previous),
                None => entries.remove(address),
            };
            return Err(e);
        }
        Ok(())
    }

    async fn remove(&self, address: &str) -> Result<(), Error> {
        let mut entries = self.entries.lock().await;
        let Some(previous) = entries.remove(address) else {
            return Ok(());
        };

        if let Err(e) = self.persist(&entries).await {
            entries.insert(address.to_string(), previous);
            return Err(e);
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>, Error> {
        Ok(self.entries.lock().await.keys().cloned().collect())
    }

    async fn flush(&self) -> Result<(), Error> {
        let entries = self.entries.lock().await;
        self.persist(&entries).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ResourceState;
    use serde_json::json;
    use tempfile::tempdir;

    fn zone_record(line: u32) -> TrackedResource {
        let attributes = json!({"zone": "example.com", "name": "www", "address": "192.0.2.1"})
            .as_object()
            .cloned()
            .unwrap();
        TrackedResource::new(
            "cpanel_zone_record",
            ResourceState::new(format!("example.com:{line}"), attributes),
        )
    }

    #[tokio::test]
    async fn test_entries_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = FileStateStore::new(&path).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
        assert!(!path.exists(), "opening must not create the file");

        store
            .put("cpanel_zone_record.www", &zone_record(12))
            .await
            .unwrap();

        let reopened = FileStateStore::new(&path).await.unwrap();
        let tracked = reopened.get("cpanel_zone_record.www").await.unwrap().unwrap();
        assert_eq!(tracked.id, "example.com:12");
        assert_eq!(tracked.attributes["address"], "192.0.2.1");
    }

    #[tokio::test]
    async fn test_remove_is_written_through() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = FileStateStore::new(&path).await.unwrap();
        store
            .put("cpanel_zone_record.www", &zone_record(12))
            .await
            .unwrap();
        store.remove("cpanel_zone_record.www").await.unwrap();
        store.remove("cpanel_zone_record.www").await.unwrap();

        let reopened = FileStateStore::new(&path).await.unwrap();
        assert!(reopened.get("cpanel_zone_record.www").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupted_file_falls_back_to_backup() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = FileStateStore::new(&path).await.unwrap();
        store
            .put("cpanel_zone_record.www", &zone_record(1))
            .await
            .unwrap();
        // The second write backs up the first
        store
            .put("cpanel_zone_record.www", &zone_record(2))
            .await
            .unwrap();
        assert!(sibling(&path, "backup").exists());

        fs::write(&path, b"{ not json").await.unwrap();

        let reopened = FileStateStore::new(&path).await.unwrap();
        let tracked = reopened.get("cpanel_zone_record.www").await.unwrap().unwrap();
        assert_eq!(tracked.id, "example.com:1");

        // The corrupted file was replaced
        let restored = fs::read_to_string(&path).await.unwrap();
        assert!(restored.contains("example.com:1"));
    }

    #[tokio::test]
    async fn test_corrupted_file_without_backup_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, b"garbage").await.unwrap();

        let store = FileStateStore::new(&path).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_document_layout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let store = FileStateStore::new(&path).await.unwrap();
        store
            .put("cpanel_zone_record.www", &zone_record(3))
            .await
            .unwrap();
        store
            .put("cpanel_domain.shop", &zone_record(4))
            .await
            .unwrap();

        let content = fs::read_to_string(&path).await.unwrap();
        assert!(content.contains("\"version\": \"1.0\""));
        assert!(!content.contains("token"));
        assert!(
            content.find("cpanel_domain.shop") < content.find("cpanel_zone_record.www"),
            "addresses are written sorted"
        );
        assert!(!sibling(&path, "tmp").exists());
    }
}
