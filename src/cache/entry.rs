use crate::extract::PageRecord;
use serde::{Deserialize, Serialize};

/// Payload stored in a cache entry
///
/// The variant tag is written to disk, so a read can tell an extracted page
/// from an arbitrary payload without inspecting its shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum CachedContent {
    /// A successfully extracted page
    Page(PageRecord),
    /// Any other JSON payload
    Raw(serde_json::Value),
}

/// On-disk representation of one cached URL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Creation time in seconds since the Unix epoch
    pub timestamp: f64,

    /// The cached payload
    pub content: CachedContent,
}

impl CacheEntry {
    /// Creates an entry stamped with the current time
    pub fn new(content: CachedContent) -> Self {
        Self {
            timestamp: now_seconds(),
            content,
        }
    }

    /// Age of the entry relative to `now` (seconds since the epoch)
    pub fn age(&self, now: f64) -> f64 {
        now - self.timestamp
    }

    /// An entry is fresh while its age is strictly below `expiry` seconds
    ///
    /// With an expiry of zero no entry is ever fresh.
    pub fn is_fresh(&self, expiry: f64, now: f64) -> bool {
        self.age(now) < expiry
    }
}

/// Current time as fractional seconds since the Unix epoch
pub fn now_seconds() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}
