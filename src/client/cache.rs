//! Device-local key/value persistence, the counterpart of browser local storage.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

use crate::constants::SAVED_POSTS_CACHE_KEY;
use crate::models::SavedPostRecord;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cache payload error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Cache lock poisoned")]
    Poisoned,
}

pub type CacheResult<T> = Result<T, CacheError>;

/// String values stored under string keys, each value rewritten in full
pub trait LocalCache: Send + Sync {
    fn get(&self, key: &str) -> CacheResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> CacheResult<()>;
    fn remove(&self, key: &str) -> CacheResult<()>;
}

/// One JSON file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new(dir: impl AsRef<Path>) -> CacheResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file_name}.json"))
    }
}

impl LocalCache for FileCache {
    fn get(&self, key: &str) -> CacheResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> CacheResult<()> {
        let path = self.path_for(key);
        // Write-then-rename so a crash never leaves half a file behind
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> CacheResult<()> {
        match fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Volatile cache, for tests and for hosts without a writable disk
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalCache for MemoryCache {
    fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> CacheResult<()> {
        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> CacheResult<()> {
        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// Read the saved-post mirror; a missing key is an empty list
pub fn load_records(cache: &dyn LocalCache) -> CacheResult<Vec<SavedPostRecord>> {
    match cache.get(SAVED_POSTS_CACHE_KEY)? {
        Some(json) => Ok(serde_json::from_str(&json)?),
        None => Ok(Vec::new()),
    }
}

/// Rewrite the saved-post mirror in full
pub fn store_records(cache: &dyn LocalCache, records: &[SavedPostRecord]) -> CacheResult<()> {
    let json = serde_json::to_string(records)?;
    cache.set(SAVED_POSTS_CACHE_KEY, &json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_cache_set_get_remove() {
        let temp_dir = TempDir::new().unwrap();
        let cache = FileCache::new(temp_dir.path().join("cache")).unwrap();

        assert_eq!(cache.get("savedPosts").unwrap(), None);
        cache.set("savedPosts", "[]").unwrap();
        assert_eq!(cache.get("savedPosts").unwrap().as_deref(), Some("[]"));

        cache.remove("savedPosts").unwrap();
        cache.remove("savedPosts").unwrap();
        assert_eq!(cache.get("savedPosts").unwrap(), None);
    }

    #[test]
    fn test_file_cache_keys_cannot_escape_dir() {
        let temp_dir = TempDir::new().unwrap();
        let cache = FileCache::new(temp_dir.path()).unwrap();

        let path = cache.path_for("../outside");
        assert_eq!(path.parent().unwrap(), temp_dir.path());
    }

    #[test]
    fn test_records_are_rewritten_in_full() {
        let cache = MemoryCache::new();
        let first = SavedPostRecord::local("u1", "101", "X", "");
        let second = SavedPostRecord::local("u1", "102", "Y", "");

        store_records(&cache, &[first.clone(), second]).unwrap();
        store_records(&cache, &[first.clone()]).unwrap();

        assert_eq!(load_records(&cache).unwrap(), vec![first]);
    }

    #[test]
    fn test_corrupt_cache_is_an_error() {
        let cache = MemoryCache::new();
        cache.set(SAVED_POSTS_CACHE_KEY, "{not json").unwrap();
        assert!(matches!(load_records(&cache), Err(CacheError::Json(_))));
    }
}
