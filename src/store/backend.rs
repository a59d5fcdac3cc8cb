use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{Storage, StorageError};

/// In-memory storage with an optional byte quota over all keys and values.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: HashMap::new(),
            quota: Some(quota),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    fn size_with(&self, key: &str, value: &str) -> usize {
        let others: usize = self
            .entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum();
        others + key.len() + value.len()
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota {
            let size = self.size_with(key, value);
            if size > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    size,
                    quota,
                });
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Directory-backed storage: every key is a `<key>.json` file.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open `dir`, creating it if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        // write-then-rename so a crash never leaves a half written array behind
        let path = self.path(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn memory_read_missing_key() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.read("missing").unwrap(), None);
    }

    #[test]
    fn memory_write_then_read() {
        let mut storage = MemoryStorage::new();
        storage.write("k", "[1,2]").unwrap();
        assert_eq!(storage.read("k").unwrap().as_deref(), Some("[1,2]"));
        assert_eq!(storage.get("k"), Some("[1,2]"));
    }

    #[test]
    fn memory_quota_rejects_oversized_write() {
        let mut storage = MemoryStorage::with_quota(10);
        storage.write("k", "12345").unwrap();

        let result = storage.write("other", "123456");
        assert!(matches!(
            result,
            Err(StorageError::QuotaExceeded { size: 17, quota: 10, .. })
        ));
        assert_eq!(storage.get("other"), None);
    }

    #[test]
    fn memory_quota_counts_replaced_value_once() {
        let mut storage = MemoryStorage::with_quota(10);
        storage.write("k", "12345678").unwrap();
        storage.write("k", "87654321").unwrap();
        assert_eq!(storage.get("k"), Some("87654321"));
    }

    #[test]
    fn file_read_missing_key() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        assert_eq!(storage.read("xrp_calculations").unwrap(), None);
    }

    #[test]
    fn file_write_then_read() {
        let dir = TempDir::new().unwrap();
        let mut storage = FileStorage::open(dir.path()).unwrap();
        storage.write("xrp_calculations", "[]").unwrap();

        assert_eq!(
            storage.read("xrp_calculations").unwrap().as_deref(),
            Some("[]")
        );
        assert!(dir.path().join("xrp_calculations.json").exists());
        assert!(!dir.path().join("xrp_calculations.json.tmp").exists());
    }

    #[test]
    fn file_open_creates_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let storage = FileStorage::open(&nested).unwrap();
        assert!(nested.is_dir());
        assert_eq!(storage.dir(), nested.as_path());
    }
}
