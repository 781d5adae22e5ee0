//! Transient cache for the latest maintenance outcome.
//!
//! Holds one entry under a fixed key so a dashboard can show the last
//! result without re-querying the store. Entries expire after a TTL.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::disposition::DispositionResult;
use crate::error::{PostsweepError, Result};
use crate::types::TriggeredBy;

/// Key the latest result is stored under
pub const NOTIFICATION_KEY: &str = "postsweep_maintenance_notification";

/// Default time-to-live for the cached result
pub const DEFAULT_TTL_HOURS: i64 = 12;

/// A cached result and its validity window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResult {
    pub key: String,
    pub result: DispositionResult,
    pub triggered_by: TriggeredBy,
    pub stored_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CachedResult {
    pub fn new(
        result: DispositionResult,
        triggered_by: TriggeredBy,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            key: NOTIFICATION_KEY.to_string(),
            result,
            triggered_by,
            stored_at: now,
            expires_at: now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Storage for the latest non-empty result
pub trait ResultCache: Send + Sync {
    /// Replace the cached entry
    fn put(&self, entry: CachedResult) -> Result<()>;

    /// The cached entry, unless missing or expired at `now`
    fn latest(&self, now: DateTime<Utc>) -> Result<Option<CachedResult>>;
}

/// Process-local cache; clones share the same slot
#[derive(Debug, Clone, Default)]
pub struct MemoryResultCache {
    slot: Arc<Mutex<Option<CachedResult>>>,
}

impl MemoryResultCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResultCache for MemoryResultCache {
    fn put(&self, entry: CachedResult) -> Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|e| PostsweepError::cache(format!("cache lock poisoned: {e}")))?;
        *slot = Some(entry);
        Ok(())
    }

    fn latest(&self, now: DateTime<Utc>) -> Result<Option<CachedResult>> {
        let slot = self
            .slot
            .lock()
            .map_err(|e| PostsweepError::cache(format!("cache lock poisoned: {e}")))?;
        Ok(slot.clone().filter(|entry| !entry.is_expired(now)))
    }
}

/// JSON file cache, shared between CLI invocations
#[derive(Debug, Clone)]
pub struct FileResultCache {
    path: PathBuf,
}

impl FileResultCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ResultCache for FileResultCache {
    fn put(&self, entry: CachedResult) -> Result<()> {
        let json = serde_json::to_string_pretty(&entry)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    fn latest(&self, now: DateTime<Utc>) -> Result<Option<CachedResult>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let entry: CachedResult = serde_json::from_str(&content)?;
        Ok(Some(entry).filter(|entry| !entry.is_expired(now)))
    }
}
