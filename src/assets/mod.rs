pub mod cache;
pub mod fetcher;
pub mod worker;

pub use cache::{Cache, CacheStorage, CachedResponse};
pub use fetcher::{AssetFetcher, HttpFetcher};
pub use worker::{AssetWorker, FetchOutcome, ServedFrom};
