//! Process-wide memoization of vulnerability lookups.
//!
//! Keys are normalized `name@version` strings. The cache bounds external
//! query volume two ways: results (including empty ones) are held for a
//! TTL, and concurrent misses on the same key are collapsed into a single
//! upstream call (the other waiters observe the first result).
//!
//! Fetches run as spawned tasks, so a caller that times out or is
//! cancelled does not abort the upstream call; the result still lands in
//! the cache for future requests.

use crate::ports::outbound::{Advisory, LookupError};
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::warn;

#[derive(Debug, Clone)]
struct CacheEntry {
    advisories: Vec<Advisory>,
    fetched_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant) -> bool {
        now.duration_since(self.fetched_at) < self.ttl
    }

    /// Internal invariant check. A violated entry is treated as corrupt:
    /// logged, dropped, and rebuilt by the next fetch.
    fn is_well_formed(&self, now: Instant) -> bool {
        self.fetched_at <= now
            && self
                .advisories
                .iter()
                .all(|a| (0.0..=10.0).contains(&a.score) && !a.id.is_empty())
    }
}

pub struct CorrelationCache {
    entries: Arc<DashMap<String, CacheEntry>>,
    inflight: DashMap<String, Arc<Mutex<()>>>,
    positive_ttl: Duration,
    negative_ttl: Duration,
}

impl CorrelationCache {
    pub fn new(positive_ttl: Duration, negative_ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            inflight: DashMap::new(),
            positive_ttl,
            negative_ttl,
        }
    }

    /// Returns the cached advisories for `key`, fetching on miss.
    ///
    /// The fetch future is spawned, not awaited inline: dropping this
    /// call's future (per-entry timeout, request cancellation) leaves the
    /// upstream call running to completion so it can populate the cache.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: &str,
        fetch: F,
    ) -> Result<Vec<Advisory>, LookupError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Vec<Advisory>, LookupError>> + Send + 'static,
    {
        if let Some(hit) = self.lookup(key) {
            return Ok(hit);
        }

        // Per-key guard: concurrent misses for the same unseen key issue
        // at most one upstream query.
        let guard = self
            .inflight
            .entry(key.to_owned())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let fetched = {
            let _held = guard.lock().await;

            // A previous holder may have filled the entry while we waited.
            if let Some(hit) = self.lookup(key) {
                Ok(hit)
            } else {
                let entries = Arc::clone(&self.entries);
                let key_owned = key.to_owned();
                let (positive_ttl, negative_ttl) = (self.positive_ttl, self.negative_ttl);
                let handle = tokio::spawn(async move {
                    let result = fetch().await;
                    if let Ok(ref advisories) = result {
                        let ttl = if advisories.is_empty() {
                            // Negative caching: remember the absence briefly so
                            // known-unknown packages do not hammer the source.
                            negative_ttl
                        } else {
                            positive_ttl
                        };
                        entries.insert(
                            key_owned,
                            CacheEntry {
                                advisories: advisories.clone(),
                                fetched_at: Instant::now(),
                                ttl,
                            },
                        );
                    }
                    result
                });

                match handle.await {
                    Ok(result) => result,
                    Err(join_error) => Err(LookupError::Unavailable(format!(
                        "lookup task failed: {}",
                        join_error
                    ))),
                }
            }
        };

        // The guard is only needed while a fetch is in flight. The last
        // waiter out drops the entry, keeping the map bounded by concurrent
        // keys rather than every key ever queried.
        drop(guard);
        self.inflight
            .remove_if(key, |_, g| Arc::strong_count(g) == 1);

        fetched
    }

    /// Lock-free read path. Expired and corrupt entries are removed.
    fn lookup(&self, key: &str) -> Option<Vec<Advisory>> {
        let now = Instant::now();
        let entry = self.entries.get(key)?;
        if !entry.is_well_formed(now) {
            warn!(key, "corrupt correlation cache entry, rebuilding");
            drop(entry);
            self.entries.remove(key);
            return None;
        }
        if !entry.is_fresh(now) {
            drop(entry);
            self.entries.remove(key);
            return None;
        }
        Some(entry.advisories.clone())
    }

    #[cfg(test)]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn inflight_count(&self) -> usize {
        self.inflight.len()
    }
}
