//! File-backed session storage.
//!
//! Keys live in a single JSON object in the platform config directory:
//! - Linux/macOS: ~/.config/portcullis/session.json
//! - Windows: %APPDATA%/portcullis/session.json
//!
//! ```json
//! {
//!   "authState": "3f1c...",
//!   "authToken": "eyJhbGciOi..."
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use portcullis_application::ports::{SessionStorage, StorageError};

use crate::serialization::{from_json_bytes, to_json_stable};

type Entries = BTreeMap<String, String>;

/// Key/value storage persisted as one JSON file.
///
/// Every write rewrites the whole file through a temporary sibling and a
/// rename, so a crash never leaves a half-written session behind.
#[derive(Debug)]
pub struct FileSessionStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSessionStorage {
    /// Storage backed by `path`. The file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Storage at the platform default location.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unavailable`] if the platform has no config
    /// directory.
    pub fn open_default() -> Result<Self, StorageError> {
        Self::default_path().map(Self::new).ok_or_else(|| {
            StorageError::Unavailable("could not determine config directory".to_string())
        })
    }

    /// `<config dir>/portcullis/session.json`, if a config dir exists.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("portcullis").join("session.json"))
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<Entries, StorageError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Entries::new()),
            Err(e) => return Err(StorageError::Io(e)),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Entries::new());
        }
        from_json_bytes(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    fn write_entries(&self, entries: &Entries) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = to_json_stable(entries).map_err(|e| StorageError::Serialization(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn update(&self, apply: impl FnOnce(&mut Entries) -> bool) -> Result<(), StorageError> {
        let _guard = self.lock.lock();
        let mut entries = self.read_entries()?;
        if apply(&mut entries) {
            self.write_entries(&entries)?;
        }
        Ok(())
    }
}

impl SessionStorage for FileSessionStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock();
        Ok(self.read_entries()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string()).as_deref() != Some(value)
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.update(|entries| entries.remove(key).is_some())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn storage(dir: &TempDir) -> FileSessionStorage {
        FileSessionStorage::new(dir.path().join("nested").join("session.json"))
    }

    #[test]
    fn default_path_is_under_portcullis() {
        if let Some(p) = FileSessionStorage::default_path() {
            assert!(p.ends_with("portcullis/session.json"));
        }
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);
        assert_eq!(storage.get("authToken").unwrap(), None);
        assert!(!storage.path().exists());
    }

    #[test]
    fn values_survive_a_new_instance() {
        let dir = TempDir::new().unwrap();
        storage(&dir).set("authToken", "abc.def.ghi").unwrap();
        storage(&dir).set("authState", "s-1").unwrap();

        let reopened = storage(&dir);
        assert_eq!(
            reopened.get("authToken").unwrap().as_deref(),
            Some("abc.def.ghi")
        );
        assert_eq!(reopened.get("authState").unwrap().as_deref(), Some("s-1"));
    }

    #[test]
    fn remove_only_drops_the_key() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);
        storage.set("authToken", "t").unwrap();
        storage.set("authState", "s").unwrap();

        storage.remove("authToken").unwrap();
        storage.remove("authToken").unwrap();

        assert_eq!(storage.get("authToken").unwrap(), None);
        assert_eq!(storage.get("authState").unwrap().as_deref(), Some("s"));
    }

    #[test]
    fn file_is_plain_sorted_json() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);
        storage.set("authToken", "t").unwrap();
        storage.set("authState", "s").unwrap();

        let raw = fs::read_to_string(storage.path()).unwrap();
        assert_eq!(raw, "{\n  \"authState\": \"s\",\n  \"authToken\": \"t\"\n}\n");
    }

    #[test]
    fn corrupt_file_is_a_serialization_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{ not json").unwrap();

        let storage = FileSessionStorage::new(path);
        assert!(matches!(
            storage.get("authToken"),
            Err(StorageError::Serialization(_))
        ));
    }
}
