//! File-backed storage.
//!
//! The whole store is one JSON object. Each mutation writes a sibling temp
//! file and renames it over the original, so a crash mid-write leaves either
//! the old or the new contents, never a truncated file.

use crate::{LocalStorage, StorageError, StorageResult};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct FileStorage {
    path: PathBuf,
    // Cached contents; the file is only read at open.
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open (or lazily create) the store at `path`.
    ///
    /// A file that exists but does not parse is treated as empty and logged,
    /// matching how a browser discards an unreadable storage entry.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Discarding unreadable local storage file");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(StorageError::Io(e)),
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&json)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl LocalStorage for FileStorage {
    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut entries = self.entries.lock();
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        let mut entries = self.entries.lock();
        if entries.remove(key).is_none() {
            return Ok(false);
        }
        self.flush(&entries)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn values_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state").join("client-state.json");

        let storage = FileStorage::open(&path).unwrap();
        storage.set("a", "1").unwrap();
        storage.set("b", "2").unwrap();
        assert!(storage.delete("a").unwrap());
        drop(storage);

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get("a").unwrap(), None);
        assert_eq!(reopened.get("b").unwrap(), Some("2".to_string()));
    }

    #[test]
    fn missing_file_is_empty_and_not_created_until_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("client-state.json");

        let storage = FileStorage::open(&path).unwrap();
        assert!(!storage.has("anything").unwrap());
        assert!(!path.exists());
        assert!(!storage.delete("anything").unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn corrupt_file_is_discarded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("client-state.json");
        fs::write(&path, "{ not json").unwrap();

        let storage = FileStorage::open(&path).unwrap();
        assert_eq!(storage.get("k").unwrap(), None);

        storage.set("k", "v").unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"k\""));
    }

    #[test]
    fn no_temp_file_left_behind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("client-state.json");

        let storage = FileStorage::open(&path).unwrap();
        storage.set("k", "v").unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["client-state.json".to_string()]);
    }
}
