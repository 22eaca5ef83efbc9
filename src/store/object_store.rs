// Directory-backed object store.
// Each record is a JSON file named by its key, written atomically via a temp file.

use std::fs;
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::Result;

use super::paths::record_path;

/// Wrapper for stored values with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record<T> {
    /// The stored value.
    pub value: T,
    /// When the value was written.
    pub stored_at: DateTime<Utc>,
}

impl<T> Record<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            stored_at: Utc::now(),
        }
    }
}

/// Read a JSON file, returning None if it does not exist.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&contents)?))
}

/// Write bytes atomically via a temp file in the same directory.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension("tmp");
    let mut file = fs::File::create(&temp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Write a value as pretty JSON.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    write_atomic(path, json.as_bytes())
}

/// Delete a file if present.
pub fn delete(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}

/// A keyed collection of records of one type.
#[derive(Debug, Clone)]
pub struct ObjectStore<T> {
    dir: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> ObjectStore<T> {
    /// Open a store rooted at `dir`. The directory is created by the database upgrade.
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            _marker: PhantomData,
        }
    }

    /// Insert or replace the record at `key`.
    pub fn put(&self, key: u64, value: &T) -> Result<()> {
        write_json(&record_path(&self.dir, key), &Record::new(value))
    }

    /// Get the record at `key` together with its metadata.
    pub fn get_record(&self, key: u64) -> Result<Option<Record<T>>> {
        read_json(&record_path(&self.dir, key))
    }

    /// Get the value at `key`.
    pub fn get(&self, key: u64) -> Result<Option<T>> {
        Ok(self.get_record(key)?.map(|record| record.value))
    }

    /// All keys in ascending order.
    pub fn keys(&self) -> Result<Vec<u64>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut keys: Vec<u64> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "json") {
                    path.file_stem()?.to_str()?.parse().ok()
                } else {
                    None
                }
            })
            .collect();
        keys.sort_unstable();
        Ok(keys)
    }

    /// All values in key order.
    pub fn get_all(&self) -> Result<Vec<T>> {
        let mut values = Vec::new();
        for key in self.keys()? {
            if let Some(value) = self.get(key)? {
                values.push(value);
            }
        }
        Ok(values)
    }

    /// Remove the record at `key`. Missing keys are not an error.
    pub fn delete(&self, key: u64) -> Result<()> {
        delete(&record_path(&self.dir, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct TestData {
        name: String,
        value: i32,
    }

    fn data(name: &str, value: i32) -> TestData {
        TestData {
            name: name.to_string(),
            value,
        }
    }

    #[test]
    fn test_put_and_get() {
        let temp_dir = TempDir::new().unwrap();
        let store = ObjectStore::new(temp_dir.path().join("things"));

        store.put(42, &data("answer", 42)).unwrap();

        assert_eq!(store.get(42).unwrap(), Some(data("answer", 42)));
        let record = store.get_record(42).unwrap().unwrap();
        assert!(record.stored_at <= Utc::now());
    }

    #[test]
    fn test_put_overwrites_same_key() {
        let temp_dir = TempDir::new().unwrap();
        let store = ObjectStore::new(temp_dir.path().join("things"));

        store.put(1, &data("first", 1)).unwrap();
        store.put(1, &data("second", 2)).unwrap();

        assert_eq!(store.get_all().unwrap(), vec![data("second", 2)]);
    }

    #[test]
    fn test_get_all_in_key_order() {
        let temp_dir = TempDir::new().unwrap();
        let store = ObjectStore::new(temp_dir.path().join("things"));

        store.put(10, &data("ten", 10)).unwrap();
        store.put(2, &data("two", 2)).unwrap();
        store.put(7, &data("seven", 7)).unwrap();

        assert_eq!(store.keys().unwrap(), vec![2, 7, 10]);
        let names: Vec<String> = store
            .get_all()
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["two", "seven", "ten"]);
    }

    #[test]
    fn test_delete() {
        let temp_dir = TempDir::new().unwrap();
        let store = ObjectStore::new(temp_dir.path().join("things"));

        store.put(1, &data("a", 1)).unwrap();
        store.put(2, &data("b", 2)).unwrap();

        store.delete(1).unwrap();
        store.delete(99).unwrap();
        assert_eq!(store.keys().unwrap(), vec![2]);
        assert!(store.get(1).unwrap().is_none());
    }

    #[test]
    fn test_missing_store_reads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store: ObjectStore<TestData> = ObjectStore::new(temp_dir.path().join("absent"));

        assert!(store.get(1).unwrap().is_none());
        assert!(store.keys().unwrap().is_empty());
    }
}
