//! File-backed response cache with expiry
//!
//! Each cached URL lives in its own `{sha256(normalized url)}.json` file under
//! the cache directory. Entries are written through a temporary file and
//! renamed into place, so readers never observe a half-written entry and
//! writers to different keys never contend.
//!
//! The cache is best-effort: unreadable, incomplete, or expired entries are
//! deleted and reported as misses, never as errors.

mod entry;

pub use entry::{now_seconds, CacheEntry, CachedContent};

use crate::extract::PageRecord;
use crate::url::normalize;
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const ENTRY_EXTENSION: &str = "json";

/// Computes the cache key for a URL
///
/// Equivalent spellings of a URL share a key because the normalized form is
/// hashed, not the raw string.
pub fn cache_key(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize(url).as_bytes());
    hex::encode(hasher.finalize())
}

/// Expiry-aware persistent cache keyed by normalized URL
#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
    expiry: f64,
}

impl ResponseCache {
    /// Opens a cache rooted at `dir`, creating the directory if needed
    ///
    /// # Arguments
    ///
    /// * `dir` - Directory that holds the entry files
    /// * `expiry_secs` - Entry lifetime in seconds
    ///
    /// # Returns
    ///
    /// * `Ok(ResponseCache)` - The directory exists and is usable
    /// * `Err(io::Error)` - The directory could not be created
    pub fn new(dir: impl AsRef<Path>, expiry_secs: u64) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            expiry: expiry_secs as f64,
        })
    }

    /// Directory holding the entry files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, url: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", cache_key(url), ENTRY_EXTENSION))
    }

    /// Returns the cached content for `url`, if present and fresh
    ///
    /// Corrupt and expired entries are removed as a side effect.
    pub fn get(&self, url: &str) -> Option<CachedContent> {
        let path = self.entry_path(url);

        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Unreadable cache entry for {}: {}", url, e);
                discard(&path);
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Corrupt cache entry for {}: {}", url, e);
                discard(&path);
                return None;
            }
        };

        if !entry.is_fresh(self.expiry, now_seconds()) {
            tracing::debug!("Cache entry for {} expired", url);
            discard(&path);
            return None;
        }

        tracing::trace!("Cache hit for {}", url);
        Some(entry.content)
    }

    /// Stores `content` for `url`, replacing any previous entry
    ///
    /// Concurrent writers to the same key race; the last rename wins.
    pub fn set(&self, url: &str, content: CachedContent) -> io::Result<()> {
        let entry = CacheEntry::new(content);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        serde_json::to_writer(&mut tmp, &entry)?;
        tmp.flush()?;
        tmp.persist(self.entry_path(url)).map_err(|e| e.error)?;
        Ok(())
    }

    /// Returns the cached page record for `url`, if the entry holds one
    pub fn get_page(&self, url: &str) -> Option<PageRecord> {
        match self.get(url)? {
            CachedContent::Page(record) => Some(record),
            CachedContent::Raw(_) => None,
        }
    }

    /// Caches an extracted page record
    pub fn set_page(&self, url: &str, record: &PageRecord) -> io::Result<()> {
        self.set(url, CachedContent::Page(record.clone()))
    }

    /// Removes the entry for `url`; returns whether one existed
    pub fn remove(&self, url: &str) -> bool {
        fs::remove_file(self.entry_path(url)).is_ok()
    }

    /// Deletes every expired or unreadable entry
    ///
    /// # Returns
    ///
    /// The number of entries removed
    pub fn clear_expired(&self) -> usize {
        let now = now_seconds();
        let mut removed = 0;

        for path in self.entry_files() {
            let stale = match fs::read_to_string(&path)
                .ok()
                .and_then(|raw| serde_json::from_str::<CacheEntry>(&raw).ok())
            {
                Some(entry) => !entry.is_fresh(self.expiry, now),
                None => true,
            };

            if stale && fs::remove_file(&path).is_ok() {
                removed += 1;
            }
        }

        tracing::debug!("Removed {} stale cache entries", removed);
        removed
    }

    /// Deletes every entry regardless of age
    pub fn clear(&self) -> usize {
        self.entry_files()
            .into_iter()
            .filter(|path| fs::remove_file(path).is_ok())
            .count()
    }

    fn entry_files(&self) -> Vec<PathBuf> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Cannot list cache directory {}: {}", self.dir.display(), e);
                return Vec::new();
            }
        };

        entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some(ENTRY_EXTENSION))
            .collect()
    }
}

fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            tracing::debug!("Failed to remove cache entry {}: {}", path.display(), e);
        }
    }
}
