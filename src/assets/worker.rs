// Asset worker.
// Intercepts asset fetches: precaches static files on install, serves them
// cache-first, keeps photographs in a separate width-independent cache, and
// prunes outdated cache versions on activation.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::config::Config;
use crate::error::Result;

use super::cache::{Cache, CacheStorage, CachedResponse};
use super::fetcher::AssetFetcher;

/// Body served when a static asset is neither cached nor reachable.
pub const OFFLINE_FALLBACK_BODY: &str = "No internet or error 500";

/// Backend paths that bypass the asset caches.
const PASSTHROUGH_PREFIXES: [&str; 2] = ["/restaurants/", "/reviews/"];

static WIDTH_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-\d+px\.jpg$").expect("valid width suffix pattern"));

/// Image cache key: the URL with any trailing `-<width>px.jpg` removed.
pub fn normalize_image_url(url: &str) -> String {
    WIDTH_SUFFIX.replace(url, "").into_owned()
}

/// Split an absolute URL into its origin and path (query included).
fn split_origin(url: &str) -> Option<(&str, &str)> {
    let scheme_end = url.find("://")? + 3;
    match url[scheme_end..].find(['/', '?', '#']) {
        Some(i) => Some((&url[..scheme_end + i], &url[scheme_end + i..])),
        None => Some((url, "/")),
    }
}

/// Where a fetched response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServedFrom {
    Cache,
    Network,
    Fallback,
}

/// Result of routing a fetch through the worker.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// Not intercepted; the caller talks to the network directly.
    Passthrough,
    Served {
        response: CachedResponse,
        from: ServedFrom,
    },
}

pub struct AssetWorker {
    storage: CacheStorage,
    fetcher: Arc<dyn AssetFetcher>,
    origin: String,
    static_cache: String,
    image_cache: String,
    cache_prefix: String,
    allowed: Vec<String>,
    precache: Vec<String>,
}

impl AssetWorker {
    pub fn new(storage: CacheStorage, fetcher: Arc<dyn AssetFetcher>, config: &Config) -> Self {
        Self {
            storage,
            fetcher,
            origin: config.asset_origin.trim_end_matches('/').to_string(),
            static_cache: config.static_cache.clone(),
            image_cache: config.image_cache.clone(),
            cache_prefix: config.cache_prefix.clone(),
            allowed: config.allowed_caches(),
            precache: config.precache.clone(),
        }
    }

    pub fn storage(&self) -> &CacheStorage {
        &self.storage
    }

    /// Resolve a path relative to the asset origin; absolute URLs pass through.
    pub fn resolve(&self, path_or_url: &str) -> String {
        if path_or_url.contains("://") {
            path_or_url.to_string()
        } else {
            format!("{}/{}", self.origin, path_or_url.trim_start_matches('/'))
        }
    }

    /// Populate the static cache. Failures are logged and leave the cache empty.
    pub async fn install(&self) -> Result<usize> {
        let cache = self.storage.open(&self.static_cache)?;
        let urls: Vec<String> = self.precache.iter().map(|p| self.resolve(p)).collect();
        match cache.add_all(self.fetcher.as_ref(), &urls).await {
            Ok(count) => {
                log::info!("Installed {} assets into {}", count, self.static_cache);
                Ok(count)
            }
            Err(e) => {
                log::error!("Asset install error: {}", e);
                Ok(0)
            }
        }
    }

    /// Delete caches that share our prefix but are not current.
    pub fn activate(&self) -> Result<Vec<String>> {
        let mut deleted = Vec::new();
        for name in self.storage.keys()? {
            if name.starts_with(&self.cache_prefix) && !self.allowed.contains(&name) {
                self.storage.delete(&name)?;
                log::info!("Deleted outdated cache {}", name);
                deleted.push(name);
            }
        }
        Ok(deleted)
    }

    /// Route a fetch the way the worker would intercept it.
    pub async fn handle_fetch(&self, path_or_url: &str) -> Result<FetchOutcome> {
        let url = self.resolve(path_or_url);
        let (origin, path) = split_origin(&url).unwrap_or((&url, ""));

        if PASSTHROUGH_PREFIXES.iter().any(|p| path.starts_with(p)) {
            return Ok(FetchOutcome::Passthrough);
        }

        if origin == self.origin && path.starts_with("/img/") {
            return self.serve_image(&url).await;
        }

        self.serve_static(&url).await
    }

    async fn serve_static(&self, url: &str) -> Result<FetchOutcome> {
        let cache = self.storage.open(&self.static_cache)?;
        if let Some(response) = cache.match_url(url)? {
            return Ok(served(response, ServedFrom::Cache));
        }

        match self.fetcher.fetch(url).await {
            Ok(response) => {
                store(&cache, url, &response);
                Ok(served(response, ServedFrom::Network))
            }
            Err(e) => {
                log::error!("Fetching {} failed: {}", url, e);
                let fallback = CachedResponse::new(
                    url,
                    503,
                    Some("text/plain".to_string()),
                    OFFLINE_FALLBACK_BODY.as_bytes().to_vec(),
                );
                Ok(served(fallback, ServedFrom::Fallback))
            }
        }
    }

    async fn serve_image(&self, url: &str) -> Result<FetchOutcome> {
        let cache = self.storage.open(&self.image_cache)?;
        let key = normalize_image_url(url);
        if let Some(response) = cache.match_url(&key)? {
            return Ok(served(response, ServedFrom::Cache));
        }

        let response = self.fetcher.fetch(url).await?;
        store(&cache, &key, &response);
        Ok(served(response, ServedFrom::Network))
    }

    /// Whether a photograph is available offline.
    pub fn image_cached(&self, path_or_url: &str) -> Result<bool> {
        if !self.storage.has(&self.image_cache) {
            return Ok(false);
        }
        let cache = self.storage.open(&self.image_cache)?;
        let key = normalize_image_url(&self.resolve(path_or_url));
        Ok(cache.match_url(&key)?.is_some())
    }
}

/// Keep a successful response. A failed write still serves the response.
fn store(cache: &Cache, key: &str, response: &CachedResponse) {
    if !response.is_ok() {
        return;
    }
    if let Err(e) = cache.put(key, response) {
        log::warn!("Caching {} failed: {}", key, e);
    }
}

fn served(response: CachedResponse, from: ServedFrom) -> FetchOutcome {
    FetchOutcome::Served { response, from }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::paths::{cache_entry_paths, named_cache_dir};
    use crate::testing::FakeOrigin;
    use std::sync::atomic::Ordering;
    use tempfile::TempDir;

    const ORIGIN: &str = "http://localhost:8000";

    fn worker(origin: Arc<FakeOrigin>) -> (AssetWorker, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = CacheStorage::new(temp_dir.path().to_path_buf());
        let config = Config {
            asset_origin: ORIGIN.to_string(),
            precache: vec!["/".to_string(), "css/main.css".to_string()],
            ..Config::default()
        };
        (AssetWorker::new(storage, origin, &config), temp_dir)
    }

    fn from(outcome: &FetchOutcome) -> Option<ServedFrom> {
        match outcome {
            FetchOutcome::Served { from, .. } => Some(*from),
            FetchOutcome::Passthrough => None,
        }
    }

    #[test]
    fn test_normalize_image_url() {
        assert_eq!(normalize_image_url("/img/1-800px.jpg"), "/img/1");
        assert_eq!(normalize_image_url("/img/1-400px.jpg"), "/img/1");
        assert_eq!(
            normalize_image_url("http://localhost:8000/img/10-1600px.jpg"),
            "http://localhost:8000/img/10"
        );
        assert_eq!(normalize_image_url("/img/1.jpg"), "/img/1.jpg");
        assert_eq!(normalize_image_url("/img/1-px.jpg"), "/img/1-px.jpg");
        assert_eq!(normalize_image_url("/img/1-800px.jpg?v=2"), "/img/1-800px.jpg?v=2");
        assert_eq!(normalize_image_url("/img/1-800px.png"), "/img/1-800px.png");
    }

    #[test]
    fn test_split_origin() {
        assert_eq!(
            split_origin("http://localhost:8000/img/1.jpg"),
            Some(("http://localhost:8000", "/img/1.jpg"))
        );
        assert_eq!(
            split_origin("http://localhost:8000"),
            Some(("http://localhost:8000", "/"))
        );
        assert_eq!(split_origin("/img/1.jpg"), None);
    }

    #[test]
    fn test_activate_prunes_only_outdated_prefixed_caches() {
        let (worker, _dir) = worker(Arc::new(FakeOrigin::default()));
        for name in ["rr-static-v7", "rr-static-v8", "rr-content-imgs", "other-app-v1"] {
            worker.storage().open(name).unwrap();
        }

        let deleted = worker.activate().unwrap();
        assert_eq!(deleted, vec!["rr-static-v7"]);
        assert_eq!(
            worker.storage().keys().unwrap(),
            vec!["other-app-v1", "rr-content-imgs", "rr-static-v8"]
        );
        assert!(worker.activate().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_install_precaches_static_files() {
        let origin = Arc::new(FakeOrigin::default());
        origin.serve("http://localhost:8000/", b"<html>");
        origin.serve("http://localhost:8000/css/main.css", b"body{}");
        let (worker, _dir) = worker(origin.clone());

        assert_eq!(worker.install().await.unwrap(), 2);
        let outcome = worker.handle_fetch("css/main.css").await.unwrap();
        assert_eq!(from(&outcome), Some(ServedFrom::Cache));
        assert_eq!(origin.request_count(), 2);
    }

    #[tokio::test]
    async fn test_install_failure_is_not_fatal() {
        let origin = Arc::new(FakeOrigin::default());
        origin.serve("http://localhost:8000/", b"<html>");
        let (worker, _dir) = worker(origin);

        assert_eq!(worker.install().await.unwrap(), 0);
        let cache = worker.storage().open("rr-static-v8").unwrap();
        assert!(cache.keys().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_static_cache_first_then_fallback() {
        let origin = Arc::new(FakeOrigin::default());
        origin.serve("http://localhost:8000/js/app.js", b"run()");
        let (worker, _dir) = worker(origin.clone());

        let first = worker.handle_fetch("/js/app.js").await.unwrap();
        assert_eq!(from(&first), Some(ServedFrom::Network));
        let second = worker.handle_fetch("/js/app.js").await.unwrap();
        assert_eq!(from(&second), Some(ServedFrom::Cache));
        assert_eq!(origin.request_count(), 1);

        origin.offline.store(true, Ordering::SeqCst);
        let cached = worker.handle_fetch("/js/app.js").await.unwrap();
        assert_eq!(from(&cached), Some(ServedFrom::Cache));

        match worker.handle_fetch("/js/other.js").await.unwrap() {
            FetchOutcome::Served { response, from } => {
                assert_eq!(from, ServedFrom::Fallback);
                assert_eq!(response.body, OFFLINE_FALLBACK_BODY.as_bytes());
            }
            FetchOutcome::Passthrough => panic!("static asset was not intercepted"),
        }
    }

    #[tokio::test]
    async fn test_long_url_is_cached() {
        let url = format!("http://localhost:8000/js/app.js?{}", "v=1&".repeat(30));
        let origin = Arc::new(FakeOrigin::default());
        origin.serve(&url, b"run()");
        let (worker, _dir) = worker(origin.clone());

        let first = worker.handle_fetch(&url).await.unwrap();
        assert_eq!(from(&first), Some(ServedFrom::Network));
        let second = worker.handle_fetch(&url).await.unwrap();
        assert_eq!(from(&second), Some(ServedFrom::Cache));
        assert_eq!(origin.request_count(), 1);
    }

    #[tokio::test]
    async fn test_cache_write_failure_still_serves_response() {
        let url = "http://localhost:8000/css/main.css";
        let origin = Arc::new(FakeOrigin::default());
        origin.serve(url, b"body{}");
        let (worker, dir) = worker(origin.clone());

        // A non-empty directory where the body file belongs blocks the write.
        let cache_dir = named_cache_dir(dir.path(), "rr-static-v8");
        let (_, body_path) = cache_entry_paths(&cache_dir, url);
        std::fs::create_dir_all(body_path.join("blocker")).unwrap();

        match worker.handle_fetch(url).await.unwrap() {
            FetchOutcome::Served { response, from } => {
                assert_eq!(from, ServedFrom::Network);
                assert_eq!(response.body, b"body{}");
            }
            FetchOutcome::Passthrough => panic!("static asset was not intercepted"),
        }
    }

    #[tokio::test]
    async fn test_images_share_one_entry_across_widths() {
        let origin = Arc::new(FakeOrigin::default());
        origin.serve("http://localhost:8000/img/3-800px.jpg", b"big");
        origin.serve("http://localhost:8000/img/3-400px.jpg", b"small");
        let (worker, _dir) = worker(origin.clone());

        assert!(!worker.image_cached("/img/3-400px.jpg").unwrap());
        let first = worker.handle_fetch("/img/3-800px.jpg").await.unwrap();
        assert_eq!(from(&first), Some(ServedFrom::Network));

        match worker.handle_fetch("/img/3-400px.jpg").await.unwrap() {
            FetchOutcome::Served { response, from } => {
                assert_eq!(from, ServedFrom::Cache);
                assert_eq!(response.body, b"big");
            }
            FetchOutcome::Passthrough => panic!("image was not intercepted"),
        }
        assert_eq!(origin.request_count(), 1);
        assert!(worker.image_cached("/img/3-400px.jpg").unwrap());
    }

    #[tokio::test]
    async fn test_backend_paths_pass_through() {
        let origin = Arc::new(FakeOrigin::default());
        let (worker, _dir) = worker(origin.clone());

        for path in [
            "http://localhost:1337/restaurants/1",
            "/reviews/?restaurant_id=3",
        ] {
            let outcome = worker.handle_fetch(path).await.unwrap();
            assert!(matches!(outcome, FetchOutcome::Passthrough));
        }
        assert_eq!(origin.request_count(), 0);
    }

    #[tokio::test]
    async fn test_cross_origin_image_uses_static_cache() {
        let origin = Arc::new(FakeOrigin::default());
        origin.serve("http://cdn.test/img/1-800px.jpg", b"cdn");
        let (worker, _dir) = worker(origin);

        worker
            .handle_fetch("http://cdn.test/img/1-800px.jpg")
            .await
            .unwrap();
        let static_cache = worker.storage().open("rr-static-v8").unwrap();
        assert_eq!(
            static_cache.keys().unwrap(),
            vec!["http://cdn.test/img/1-800px.jpg"]
        );
        assert!(!worker.image_cached("http://cdn.test/img/1-800px.jpg").unwrap());
    }
}
