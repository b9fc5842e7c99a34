//! JSON file-backed store.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{KeyValueStore, StorageError};

/// A store persisted as a single JSON object on disk.
///
/// The whole map is loaded on open and rewritten on every mutation. Writes go
/// to a sibling `.tmp` file that is renamed over the original, so a crash
/// mid-write leaves the previous contents intact.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: Mutex<HashMap<String, String>>,
}

impl JsonFileStore {
    /// Open the store at `path`, loading existing contents if the file exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let map = if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            let map: HashMap<String, String> = serde_json::from_reader(reader)?;
            tracing::info!(path = %path.display(), entries = map.len(), "Loaded key/value store");
            map
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            inner: Mutex::new(map),
        })
    }

    /// Like [`open`], but an unreadable file is moved aside to `<path>.corrupt`
    /// and the store starts empty. IO errors are still returned.
    ///
    /// [`open`]: JsonFileStore::open
    pub fn open_or_reset(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        match Self::open(path) {
            Err(StorageError::Serialization(e)) => {
                let quarantine = sibling(path, "corrupt");
                tracing::warn!(
                    path = %path.display(),
                    moved_to = %quarantine.display(),
                    error = %e,
                    "Key/value store is unreadable, starting empty"
                );
                if let Err(e) = fs::rename(path, &quarantine) {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to move unreadable store aside");
                }
                Ok(Self {
                    path: path.to_path_buf(),
                    inner: Mutex::new(HashMap::new()),
                })
            }
            other => other,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn with_map<R>(&self, f: impl FnOnce(&mut HashMap<String, String>) -> R) -> R {
        let mut guard = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }

    fn flush(&self, map: &HashMap<String, String>) -> Result<(), StorageError> {
        let tmp = sibling(&self.path, "tmp");
        let mut writer = BufWriter::new(File::create(&tmp)?);
        serde_json::to_writer(&mut writer, map)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// `path` with `suffix` appended as an extra extension, e.g. `cache.json.tmp`.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.with_map(|map| map.get(key).cloned()))
    }

    fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.with_map(|map| {
            map.insert(key.to_string(), value);
            self.flush(map)
        })
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.with_map(|map| {
            if map.remove(key).is_some() {
                self.flush(map)
            } else {
                Ok(())
            }
        })
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.with_map(|map| map.keys().cloned().collect()))
    }
}
