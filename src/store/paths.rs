// Filesystem locations for local data.
// Object stores live under the data directory, asset caches and the log file
// under the cache directory.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use sha2::{Digest, Sha256};

/// Longest escaped key used verbatim as a file name. Longer keys are hashed
/// so names stay well under the common 255-byte limit.
const MAX_ESCAPED_KEY: usize = 120;

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "restaurant-reviews")
}

/// Base cache directory (~/.cache/restaurant-reviews on Linux).
pub fn cache_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Base data directory (~/.local/share/restaurant-reviews on Linux).
pub fn data_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
}

/// Path to the optional TOML configuration file.
pub fn config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Path to the log file written while the TUI owns the terminal.
pub fn log_path() -> Option<PathBuf> {
    cache_dir().map(|dir| dir.join("rr.log"))
}

/// Root of the local object-store database.
pub fn db_dir() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("db"))
}

/// Root of the named asset caches.
pub fn caches_dir() -> Option<PathBuf> {
    cache_dir().map(|dir| dir.join("caches"))
}

/// Directory of a single object store inside a database root.
pub fn store_dir(db_root: &Path, store: &str) -> PathBuf {
    db_root.join(escape_key(store))
}

/// Path to a record file inside an object store directory.
pub fn record_path(store_dir: &Path, key: u64) -> PathBuf {
    store_dir.join(format!("{}.json", key))
}

/// Directory of a named asset cache.
pub fn named_cache_dir(caches_root: &Path, cache_name: &str) -> PathBuf {
    caches_root.join(escape_key(cache_name))
}

/// File stem for a cache entry: the escaped key, or `%%sha256-<hex>` when
/// that would be too long. Escaping never produces `%%`.
pub fn cache_entry_stem(url: &str) -> String {
    let escaped = escape_key(url);
    if escaped.len() <= MAX_ESCAPED_KEY {
        return escaped;
    }
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    format!("%%sha256-{}", hex::encode(hasher.finalize()))
}

/// Metadata and body paths for a cached URL.
pub fn cache_entry_paths(cache_dir: &Path, url: &str) -> (PathBuf, PathBuf) {
    let key = cache_entry_stem(url);
    (
        cache_dir.join(format!("{}.json", key)),
        cache_dir.join(format!("{}.body", key)),
    )
}

/// Escape a string for use as a single path component.
/// ASCII alphanumerics and `-_.` pass through, every other byte becomes `%XX`,
/// so distinct keys never collide.
pub fn escape_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' => out.push(byte as char),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Reverse of [`escape_key`].
pub fn unescape_key(escaped: &str) -> Option<String> {
    let bytes = escaped.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = escaped.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}
