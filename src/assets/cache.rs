// Named response caches on disk.
// Each cache is a directory; each entry is a metadata JSON file plus a body file.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::store::object_store::{delete, read_json, write_atomic, write_json};
use crate::store::paths::{cache_entry_paths, named_cache_dir, unescape_key};

use super::fetcher::AssetFetcher;

/// A fetched or cached HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl CachedResponse {
    pub fn new(url: &str, status: u16, content_type: Option<String>, body: Vec<u8>) -> Self {
        Self {
            url: url.to_string(),
            status,
            content_type,
            body,
        }
    }

    /// Whether the status is in the 2xx range.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct EntryMeta {
    /// Key the entry was stored under; long keys are hashed on disk.
    key: String,
    url: String,
    status: u16,
    content_type: Option<String>,
    stored_at: DateTime<Utc>,
}

/// The set of named caches under one root directory.
#[derive(Debug, Clone)]
pub struct CacheStorage {
    root: PathBuf,
}

impl CacheStorage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Open the default cache root.
    pub fn open_default() -> Option<Self> {
        crate::store::paths::caches_dir().map(Self::new)
    }

    /// Open a cache by name, creating it if needed.
    pub fn open(&self, name: &str) -> Result<Cache> {
        let dir = named_cache_dir(&self.root, name);
        fs::create_dir_all(&dir)?;
        Ok(Cache { dir })
    }

    pub fn has(&self, name: &str) -> bool {
        named_cache_dir(&self.root, name).is_dir()
    }

    /// Names of all existing caches, sorted.
    pub fn keys(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut names: Vec<String> = fs::read_dir(&self.root)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| unescape_key(entry.file_name().to_str()?))
            .collect();
        names.sort();
        Ok(names)
    }

    /// Delete a cache and its entries. Returns whether it existed.
    pub fn delete(&self, name: &str) -> Result<bool> {
        let dir = named_cache_dir(&self.root, name);
        if !dir.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&dir)?;
        Ok(true)
    }
}

/// A single named cache.
#[derive(Debug, Clone)]
pub struct Cache {
    dir: PathBuf,
}

impl Cache {
    /// Look up the entry stored under `key`.
    pub fn match_url(&self, key: &str) -> Result<Option<CachedResponse>> {
        let (meta_path, body_path) = cache_entry_paths(&self.dir, key);
        let Some(meta) = read_json::<EntryMeta>(&meta_path)? else {
            return Ok(None);
        };
        if !body_path.exists() {
            return Ok(None);
        }
        let body = fs::read(&body_path)?;
        Ok(Some(CachedResponse {
            url: meta.url,
            status: meta.status,
            content_type: meta.content_type,
            body,
        }))
    }

    /// Store `response` under `key`. The body is written before the metadata,
    /// so a reader never sees metadata without a body.
    pub fn put(&self, key: &str, response: &CachedResponse) -> Result<()> {
        let (meta_path, body_path) = cache_entry_paths(&self.dir, key);
        write_atomic(&body_path, &response.body)?;
        write_json(
            &meta_path,
            &EntryMeta {
                key: key.to_string(),
                url: response.url.clone(),
                status: response.status,
                content_type: response.content_type.clone(),
                stored_at: Utc::now(),
            },
        )
    }

    pub fn delete(&self, key: &str) -> Result<()> {
        let (meta_path, body_path) = cache_entry_paths(&self.dir, key);
        delete(&meta_path)?;
        delete(&body_path)
    }

    /// Keys of all stored entries, sorted.
    pub fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json")
                && let Some(meta) = read_json::<EntryMeta>(&path)?
            {
                keys.push(meta.key);
            }
        }
        keys.sort();
        Ok(keys)
    }

    /// Fetch every URL and store them all, or store nothing if any fetch
    /// fails or returns a non-success status.
    pub async fn add_all(&self, fetcher: &dyn AssetFetcher, urls: &[String]) -> Result<usize> {
        let mut responses = Vec::with_capacity(urls.len());
        for url in urls {
            let response = fetcher.fetch(url).await?;
            if !response.is_ok() {
                return Err(crate::error::AppError::Status {
                    status: response.status,
                    url: url.clone(),
                });
            }
            responses.push(response);
        }
        for (url, response) in urls.iter().zip(&responses) {
            self.put(url, response)?;
        }
        Ok(responses.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeOrigin;
    use tempfile::TempDir;

    #[test]
    fn test_put_and_match() {
        let temp_dir = TempDir::new().unwrap();
        let storage = CacheStorage::new(temp_dir.path().to_path_buf());
        let cache = storage.open("rr-static-v8").unwrap();

        let response = CachedResponse::new(
            "http://localhost:8000/css/main.css",
            200,
            Some("text/css".to_string()),
            b"body{}".to_vec(),
        );
        cache.put(&response.url, &response).unwrap();

        assert_eq!(cache.match_url(&response.url).unwrap(), Some(response.clone()));
        assert!(cache.match_url("http://localhost:8000/other.css").unwrap().is_none());
        assert_eq!(cache.keys().unwrap(), vec![response.url.clone()]);

        cache.delete(&response.url).unwrap();
        assert!(cache.match_url(&response.url).unwrap().is_none());
    }

    #[test]
    fn test_long_url_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let storage = CacheStorage::new(temp_dir.path().to_path_buf());
        let cache = storage.open("rr-static-v8").unwrap();

        let url = format!("http://localhost:8000/js/app.js?{}", "v=1&".repeat(60));
        let response = CachedResponse::new(&url, 200, None, b"js".to_vec());
        cache.put(&url, &response).unwrap();

        assert_eq!(cache.match_url(&url).unwrap(), Some(response));
        assert_eq!(cache.keys().unwrap(), vec![url.clone()]);
        cache.delete(&url).unwrap();
        assert!(cache.keys().unwrap().is_empty());
    }

    #[test]
    fn test_storage_keys_and_delete() {
        let temp_dir = TempDir::new().unwrap();
        let storage = CacheStorage::new(temp_dir.path().join("caches"));
        assert!(storage.keys().unwrap().is_empty());

        storage.open("rr-static-v8").unwrap();
        storage.open("rr-content-imgs").unwrap();
        assert_eq!(storage.keys().unwrap(), vec!["rr-content-imgs", "rr-static-v8"]);

        assert!(storage.delete("rr-static-v8").unwrap());
        assert!(!storage.delete("rr-static-v8").unwrap());
        assert!(!storage.has("rr-static-v8"));
        assert!(storage.has("rr-content-imgs"));
    }

    #[tokio::test]
    async fn test_add_all_is_all_or_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let storage = CacheStorage::new(temp_dir.path().to_path_buf());
        let cache = storage.open("rr-static-v8").unwrap();
        let origin = FakeOrigin::default();
        origin.serve("http://a/index.html", b"<html>");

        let urls = vec!["http://a/index.html".to_string(), "http://a/missing.js".to_string()];
        assert!(cache.add_all(&origin, &urls).await.is_err());
        assert!(cache.keys().unwrap().is_empty());

        origin.serve("http://a/missing.js", b"js");
        assert_eq!(cache.add_all(&origin, &urls).await.unwrap(), 2);
        assert_eq!(cache.keys().unwrap().len(), 2);
    }
}
