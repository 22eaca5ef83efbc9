// Local database with the restaurants, reviews, and offline-reviews stores.
// Opening the database upgrades its on-disk schema one version at a time.

use std::fs;
use std::path::{Path, PathBuf};

use crate::api::{NewReview, Restaurant, Review};
use crate::error::{AppError, Result};

use super::object_store::{ObjectStore, write_atomic};
use super::paths::store_dir;

/// Current schema version.
pub const DB_VERSION: u32 = 3;

pub const RESTAURANTS_STORE: &str = "restaurants";
pub const REVIEWS_STORE: &str = "reviews";
pub const OFFLINE_REVIEWS_STORE: &str = "offline-reviews";

/// Handle to the three object stores.
#[derive(Debug, Clone)]
pub struct Database {
    root: PathBuf,
    /// Restaurants keyed by id.
    pub restaurants: ObjectStore<Restaurant>,
    /// Review lists keyed by restaurant id. A write replaces the whole record.
    pub reviews: ObjectStore<Vec<Review>>,
    /// Pending reviews keyed by restaurant id, one slot per restaurant.
    pub offline_reviews: ObjectStore<NewReview>,
}

impl Database {
    /// Open (creating or upgrading) the database at `root`.
    pub fn open(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)?;

        let old_version = read_version(root)?;
        if old_version > DB_VERSION {
            return Err(AppError::Other(format!(
                "database at {} has version {}, newer than supported {}",
                root.display(),
                old_version,
                DB_VERSION
            )));
        }
        if old_version < DB_VERSION {
            upgrade(root, old_version)?;
            log::info!(
                "Upgraded local database from version {} to {}",
                old_version,
                DB_VERSION
            );
        }

        Ok(Self {
            root: root.to_path_buf(),
            restaurants: ObjectStore::new(store_dir(root, RESTAURANTS_STORE)),
            reviews: ObjectStore::new(store_dir(root, REVIEWS_STORE)),
            offline_reviews: ObjectStore::new(store_dir(root, OFFLINE_REVIEWS_STORE)),
        })
    }

    /// Open the database at the default data location.
    pub fn open_default() -> Result<Self> {
        let root = super::paths::db_dir()
            .ok_or_else(|| AppError::Other("no data directory available".to_string()))?;
        Self::open(&root)
    }

    /// Schema version currently on disk.
    pub fn version(&self) -> Result<u32> {
        read_version(&self.root)
    }
}

fn version_path(root: &Path) -> PathBuf {
    root.join("version")
}

fn read_version(root: &Path) -> Result<u32> {
    let path = version_path(root);
    if !path.exists() {
        return Ok(0);
    }
    let text = fs::read_to_string(&path)?;
    text.trim()
        .parse()
        .map_err(|_| AppError::Other(format!("corrupt database version file: {:?}", text)))
}

/// Create the stores added after `old_version`.
fn upgrade(root: &Path, old_version: u32) -> Result<()> {
    if old_version < 1 {
        fs::create_dir_all(store_dir(root, RESTAURANTS_STORE))?;
    }
    if old_version < 2 {
        fs::create_dir_all(store_dir(root, REVIEWS_STORE))?;
    }
    if old_version < 3 {
        fs::create_dir_all(store_dir(root, OFFLINE_REVIEWS_STORE))?;
    }
    write_atomic(&version_path(root), DB_VERSION.to_string().as_bytes())
}
