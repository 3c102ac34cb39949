//! In-memory TTL cache for retrieved company context.
//!
//! One entry per cache key. Entries are replaced wholesale on insert and
//! evicted lazily on the first read after they expire. The lock is held only
//! for a single map operation, never across an outbound call.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone)]
struct CacheEntry {
    documents: Vec<String>,
    inserted_at: Instant,
}

/// A cache hit: the stored documents and how long ago they were stored.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedContext {
    pub documents: Vec<String>,
    pub age: Duration,
}

pub struct ContextCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ContextCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the live entry for `key`, evicting it first if it has expired.
    pub fn get(&self, key: &str) -> Option<CachedContext> {
        let now = Instant::now();
        let mut entries = self.lock();

        let age = now.saturating_duration_since(entries.get(key)?.inserted_at);
        if age > self.ttl {
            entries.remove(key);
            return None;
        }

        entries.get(key).map(|entry| CachedContext {
            documents: entry.documents.clone(),
            age,
        })
    }

    /// Stores `documents` under `key`, replacing any previous entry.
    /// Empty results are never stored; returns whether anything was written.
    pub fn insert(&self, key: &str, documents: &[String]) -> bool {
        if documents.is_empty() {
            return false;
        }
        self.lock().insert(
            key.to_string(),
            CacheEntry {
                documents: documents.to_vec(),
                inserted_at: Instant::now(),
            },
        );
        true
    }

    // Every critical section is a single HashMap call, so a poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
impl ContextCache {
    pub fn len(&self) -> usize {
        self.lock().len()
    }
}
