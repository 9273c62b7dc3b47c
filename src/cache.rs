// Durable cache of the last raw rows fetched from the sheet.
//
// Stored as `{ "data": [...], "timestamp": <epoch millis> }` in one JSON file
// per cache key. Read and write failures are logged and treated as a miss.
use crate::error::CacheError;
use crate::types::RawRow;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_CACHE_KEY: &str = "timeline_data_cache";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: Vec<RawRow>,
    pub timestamp: i64,
}

impl CacheEntry {
    pub fn is_fresh(&self, now_ms: i64, ttl: Duration) -> bool {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        now_ms.saturating_sub(self.timestamp) < ttl_ms
    }
}

#[derive(Debug, Clone)]
pub struct RowCache {
    path: PathBuf,
    ttl: Duration,
}

impl RowCache {
    pub fn new(dir: &Path, key: &str, ttl: Duration) -> Self {
        RowCache {
            path: dir.join(format!("{}.json", key)),
            ttl,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn read_entry(&self) -> Result<Option<CacheEntry>, CacheError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&text)?))
    }

    pub fn write_at(&self, rows: &[RawRow], now_ms: i64) -> Result<(), CacheError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let entry = CacheEntry {
            data: rows.to_vec(),
            timestamp: now_ms,
        };
        // Write then rename so a reader never sees half a file.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string(&entry)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Rows from a cache entry younger than the TTL, if any.
    pub fn load_at(&self, now_ms: i64) -> Option<Vec<RawRow>> {
        match self.read_entry() {
            Ok(Some(entry)) if entry.is_fresh(now_ms, self.ttl) => Some(entry.data),
            Ok(Some(entry)) => {
                debug!(age_ms = now_ms - entry.timestamp, "cache entry is stale");
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Could not load from cache: {}", e);
                None
            }
        }
    }

    pub fn load(&self) -> Option<Vec<RawRow>> {
        self.load_at(Utc::now().timestamp_millis())
    }

    pub fn save(&self, rows: &[RawRow]) {
        if let Err(e) = self.write_at(rows, Utc::now().timestamp_millis()) {
            warn!("Could not save to cache: {}", e);
        }
    }
}
