//! Thread-view result cache.
//!
//! Built forests are cached per `(post, viewer)` so two users never see
//! each other's `user_vote` annotations. Callers on the read path absorb
//! every [`CacheError`]: a broken cache degrades to recomputation, never
//! to a failed request.

use crate::forest::CommentNode;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache lock poisoned")]
    Poisoned,
    #[error("cache backend error: {0}")]
    Backend(String),
}

/// Who is looking at the thread. Anonymous viewers share one cache slot
/// per post; signed-in viewers each get their own.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ViewerKey {
    Anonymous,
    User(String),
}

impl ViewerKey {
    #[must_use]
    pub fn from_viewer(viewer: Option<&str>) -> Self {
        viewer.map_or(Self::Anonymous, |user| Self::User(user.to_owned()))
    }
}

/// Cache key for one rendered thread.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub post_id: i64,
    pub viewer: ViewerKey,
}

impl CacheKey {
    #[must_use]
    pub fn new(post_id: i64, viewer: Option<&str>) -> Self {
        Self {
            post_id,
            viewer: ViewerKey::from_viewer(viewer),
        }
    }
}

/// Storage port for built thread forests.
pub trait ThreadCache: Send + Sync {
    /// Fetch a live entry. Expired entries read as misses.
    ///
    /// # Errors
    ///
    /// Returns a [`CacheError`] if the backend fails.
    fn get(&self, key: &CacheKey) -> Result<Option<Vec<CommentNode>>, CacheError>;

    /// Store a forest under a key, overwriting any previous entry.
    ///
    /// # Errors
    ///
    /// Returns a [`CacheError`] if the backend fails.
    fn set(&self, key: CacheKey, forest: Vec<CommentNode>) -> Result<(), CacheError>;

    /// Drop every entry for a post, across all viewers. Returns the number
    /// of entries removed.
    ///
    /// # Errors
    ///
    /// Returns a [`CacheError`] if the backend fails.
    fn invalidate_post(&self, post_id: i64) -> Result<usize, CacheError>;

    /// Purge expired entries. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns a [`CacheError`] if the backend fails.
    fn sweep(&self) -> Result<usize, CacheError>;
}

struct Entry {
    forest: Vec<CommentNode>,
    inserted_at: Instant,
}

/// In-process TTL cache behind a `Mutex`.
///
/// Expiry is lazy: `get` treats stale entries as misses and removes them;
/// `sweep` exists for callers that want to bound memory between reads.
/// Concurrent writers race last-writer-wins, which is fine for a cache.
pub struct MemoryThreadCache {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, Entry>>,
}

impl MemoryThreadCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn locked(&self) -> Result<std::sync::MutexGuard<'_, HashMap<CacheKey, Entry>>, CacheError> {
        self.entries.lock().map_err(|_| CacheError::Poisoned)
    }

    fn is_expired(&self, entry: &Entry) -> bool {
        entry.inserted_at.elapsed() >= self.ttl
    }
}

impl ThreadCache for MemoryThreadCache {
    fn get(&self, key: &CacheKey) -> Result<Option<Vec<CommentNode>>, CacheError> {
        let mut entries = self.locked()?;
        match entries.get(key) {
            Some(entry) if self.is_expired(entry) => {
                entries.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.forest.clone())),
            None => Ok(None),
        }
    }

    fn set(&self, key: CacheKey, forest: Vec<CommentNode>) -> Result<(), CacheError> {
        let mut entries = self.locked()?;
        entries.insert(
            key,
            Entry {
                forest,
                inserted_at: Instant::now(),
            },
        );
        Ok(())
    }

    fn invalidate_post(&self, post_id: i64) -> Result<usize, CacheError> {
        let mut entries = self.locked()?;
        let before = entries.len();
        entries.retain(|key, _| key.post_id != post_id);
        Ok(before - entries.len())
    }

    fn sweep(&self) -> Result<usize, CacheError> {
        let mut entries = self.locked()?;
        let before = entries.len();
        let ttl = self.ttl;
        entries.retain(|_, entry| entry.inserted_at.elapsed() < ttl);
        Ok(before - entries.len())
    }
}
