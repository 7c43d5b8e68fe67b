//! Same-day indicator cache backed by a single JSON file.
//!
//! One entry per `"{code}:{kind}:{date}"` key; the date component rolls with
//! the exchange calendar, so a new day implicitly invalidates every prior
//! entry without any eviction pass. The file is shared across runs and must
//! survive interrupted writers, so every `put` is a read-merge-write cycle
//! under a scoped lock, finishing with an atomic rename.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{IndicatorKind, MarketDay, StockCode, UtcDateTime};

/// Cache I/O errors. Callers treat a failed read as a miss and a failed
/// write as a skip; neither aborts the run.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache file write error: {0}")]
    Write(String),

    #[error("cache file rename error: {0}")]
    Replace(String),

    #[error("cache entry serialization error: {0}")]
    Serialize(String),
}

/// Composite key for one holding's indicator value on one market day.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub code: StockCode,
    pub kind: IndicatorKind,
    pub day: MarketDay,
}

impl CacheKey {
    pub fn new(code: StockCode, kind: IndicatorKind, day: MarketDay) -> Self {
        Self { code, kind, day }
    }

    pub fn render(&self) -> String {
        format!("{}:{}:{}", self.code, self.kind, self.day)
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

/// One cached fetch outcome. Written once per key; only overwritten, never
/// mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub rendered_text: String,
    pub fetched_at: UtcDateTime,
    /// Fetcher-private raw state (e.g. the flash-report watermark).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl CacheEntry {
    pub fn new(rendered_text: impl Into<String>) -> Self {
        Self {
            rendered_text: rendered_text.into(),
            fetched_at: UtcDateTime::now(),
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// On-disk cache store, opened once per orchestration run.
#[derive(Debug)]
pub struct CacheStore {
    path: PathBuf,
    /// Held for the whole read-merge-write cycle so concurrent dispatches
    /// never interleave partial file states.
    write_lock: Mutex<()>,
}

impl CacheStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up a key. A missing file, missing key, or malformed record is a
    /// plain miss; nothing errors past this boundary.
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        let _guard = self.write_lock.lock().expect("cache lock is not poisoned");
        self.read_map().remove(key)
    }

    /// Merge one entry into the file. Unrelated keys are preserved; the new
    /// map is written to a sibling temp path and renamed over the original so
    /// an interrupted process never leaves a half-written file.
    pub fn put(&self, key: &str, entry: CacheEntry) -> Result<(), CacheError> {
        let _guard = self.write_lock.lock().expect("cache lock is not poisoned");
        let mut map = self.read_map();
        map.insert(key.to_owned(), entry);
        self.replace_file(&map)
    }

    /// Drop day-keyed entries older than `day`. Keys without a trailing ISO
    /// date (fetcher watermarks) are kept. Operator-invoked; nothing calls
    /// this automatically.
    pub fn prune_before(&self, day: MarketDay) -> Result<usize, CacheError> {
        let _guard = self.write_lock.lock().expect("cache lock is not poisoned");
        let mut map = self.read_map();
        let before = map.len();
        map.retain(|key, _| match key_day(key) {
            Some(entry_day) => entry_day >= day,
            None => true,
        });
        let dropped = before - map.len();
        if dropped > 0 {
            self.replace_file(&map)?;
        }
        Ok(dropped)
    }

    fn read_map(&self) -> BTreeMap<String, CacheEntry> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) => {
                debug!(path = %self.path.display(), %error, "cache file unreadable; treating as empty");
                return BTreeMap::new();
            }
        };

        // Tolerate individual malformed records: anything that fails to
        // decode is a miss, not a poison pill for the rest of the file.
        match serde_json::from_str::<BTreeMap<String, serde_json::Value>>(&raw) {
            Ok(values) => values
                .into_iter()
                .filter_map(|(key, value)| {
                    serde_json::from_value::<CacheEntry>(value)
                        .ok()
                        .map(|entry| (key, entry))
                })
                .collect(),
            Err(error) => {
                debug!(path = %self.path.display(), %error, "cache file malformed; treating as empty");
                BTreeMap::new()
            }
        }
    }

    fn replace_file(&self, map: &BTreeMap<String, CacheEntry>) -> Result<(), CacheError> {
        let serialized = serde_json::to_string_pretty(map)
            .map_err(|error| CacheError::Serialize(error.to_string()))?;

        let tmp_path = self
            .path
            .with_extension(format!("tmp.{}", std::process::id()));
        fs::write(&tmp_path, serialized).map_err(|error| CacheError::Write(error.to_string()))?;
        fs::rename(&tmp_path, &self.path).map_err(|error| {
            let _ = fs::remove_file(&tmp_path);
            CacheError::Replace(error.to_string())
        })
    }
}

fn key_day(key: &str) -> Option<MarketDay> {
    key.rsplit(':')
        .next()
        .and_then(|segment| MarketDay::parse(segment).ok())
}
