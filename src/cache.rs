//! Content-addressed memoisation of finished analyses.
//!
//! An extraction call costs seconds and real money, and the same document is
//! often submitted more than once (re-opened tab, double click, several users
//! looking at one file). [`ResultCache`] keys every analysis by a SHA-256
//! [`Fingerprint`] of the raw document bytes and guarantees **at most one
//! in-flight computation per fingerprint**: the first caller starts the work,
//! every caller that arrives while it runs joins the same shared future and
//! receives the identical `Arc` once it resolves.
//!
//! ## Entry lifecycle
//!
//! ```text
//!   (absent) ──first request──▶ Pending ──success──▶ Completed
//!                                  │
//!                                  └──failure / timeout──▶ (absent)
//! ```
//!
//! Failures are never cached, so a later request retries cleanly.
//!
//! The computation runs in its own Tokio task. Dropping every caller does not
//! cancel it; it runs to completion (bounded by [`CachePolicy::pending_ttl`])
//! and its result is kept. A `Pending` entry that is somehow older than the
//! TTL is reclaimed on the next lookup.
//!
//! Completed entries live for the life of the cache unless
//! [`CachePolicy::completed_ttl`] is set. There is no size bound and no
//! persistence; this suits a single-instance deployment.

use crate::error::AnalysisError;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// SHA-256 of a document's raw bytes, lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(bytes: &[u8]) -> Self {
        Self(format!("{:x}", Sha256::digest(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex digits, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Eviction rules injected into a [`ResultCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Longest a computation may stay in flight before it is abandoned.
    pub pending_ttl: Duration,
    /// How long a completed analysis is served. `None` keeps it forever.
    pub completed_ttl: Option<Duration>,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            pending_ttl: Duration::from_secs(120),
            completed_ttl: None,
        }
    }
}

impl CachePolicy {
    fn completed_fresh(&self, at: Instant, now: Instant) -> bool {
        self.completed_ttl
            .map_or(true, |ttl| now.saturating_duration_since(at) < ttl)
    }

    fn pending_fresh(&self, started: Instant, now: Instant) -> bool {
        now.saturating_duration_since(started) < self.pending_ttl
    }
}

/// Observable state of one cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Pending,
    Completed,
}

/// How a [`ResultCache::get_or_compute`] call was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    /// A completed entry was returned without any work.
    Hit,
    /// The caller waited on a computation another caller started.
    Joined,
    /// The caller started the computation.
    Computed,
}

/// Value returned by the cache, with how it was obtained.
#[derive(Debug)]
pub struct Cached<V> {
    pub value: Arc<V>,
    pub status: CacheStatus,
}

type SharedResult<V> = Shared<BoxFuture<'static, Result<Arc<V>, AnalysisError>>>;

enum Slot<V> {
    Pending {
        generation: u64,
        started: Instant,
        result: SharedResult<V>,
    },
    Completed {
        at: Instant,
        value: Arc<V>,
    },
}

enum Lookup<V> {
    Hit(Arc<V>),
    Join(SharedResult<V>),
    Miss,
}

struct Inner<V> {
    slots: Mutex<HashMap<Fingerprint, Slot<V>>>,
    policy: CachePolicy,
    next_generation: AtomicU64,
}

impl<V> Inner<V> {
    fn slots(&self) -> MutexGuard<'_, HashMap<Fingerprint, Slot<V>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the outcome of computation `generation`, unless a newer one
    /// has replaced it in the meantime.
    fn settle(&self, key: &Fingerprint, generation: u64, outcome: &Result<Arc<V>, AnalysisError>) {
        let mut slots = self.slots();
        let ours = matches!(
            slots.get(key),
            Some(Slot::Pending { generation: g, .. }) if *g == generation
        );
        if !ours {
            debug!("Cache {}: outcome of superseded computation dropped", key.short());
            return;
        }
        match outcome {
            Ok(value) => {
                slots.insert(
                    key.clone(),
                    Slot::Completed {
                        at: Instant::now(),
                        value: Arc::clone(value),
                    },
                );
                info!("Cache {}: stored completed analysis", key.short());
            }
            Err(e) => {
                slots.remove(key);
                warn!("Cache {}: computation failed, entry cleared: {}", key.short(), e);
            }
        }
    }
}

/// Process-lifetime memo of analyses keyed by [`Fingerprint`].
///
/// Cloning is cheap and yields a handle to the same entries.
pub struct ResultCache<V> {
    inner: Arc<Inner<V>>,
}

impl<V> Clone for ResultCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> fmt::Debug for ResultCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultCache")
            .field("entries", &self.inner.slots().len())
            .field("policy", &self.inner.policy)
            .finish()
    }
}

impl<V> Default for ResultCache<V>
where
    V: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(CachePolicy::default())
    }
}

impl<V> ResultCache<V>
where
    V: Send + Sync + 'static,
{
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            inner: Arc::new(Inner {
                slots: Mutex::new(HashMap::new()),
                policy,
                next_generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.inner.policy
    }

    /// Return the analysis for `key`, computing it at most once.
    ///
    /// `compute` is only invoked when no fresh entry exists. Its future runs
    /// in a spawned task, so it must be `Send + 'static`. Concurrent callers
    /// for the same key all receive the same `Arc`, or the same error.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: &Fingerprint,
        compute: F,
    ) -> Result<Cached<V>, AnalysisError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, AnalysisError>> + Send + 'static,
    {
        let (shared, status) = {
            let mut slots = self.inner.slots();
            let now = Instant::now();
            let policy = &self.inner.policy;

            let lookup = match slots.get(key) {
                Some(Slot::Completed { at, value }) if policy.completed_fresh(*at, now) => {
                    Lookup::Hit(Arc::clone(value))
                }
                Some(Slot::Pending {
                    started, result, ..
                }) if policy.pending_fresh(*started, now) => Lookup::Join(result.clone()),
                Some(Slot::Pending { .. }) => {
                    warn!("Cache {}: reclaiming stale pending entry", key.short());
                    Lookup::Miss
                }
                Some(Slot::Completed { .. }) => {
                    debug!("Cache {}: completed entry expired", key.short());
                    Lookup::Miss
                }
                None => Lookup::Miss,
            };

            match lookup {
                Lookup::Hit(value) => {
                    debug!("Cache {}: hit", key.short());
                    return Ok(Cached {
                        value,
                        status: CacheStatus::Hit,
                    });
                }
                Lookup::Join(shared) => {
                    debug!("Cache {}: joining in-flight computation", key.short());
                    (shared, CacheStatus::Joined)
                }
                Lookup::Miss => {
                    let generation = self.inner.next_generation.fetch_add(1, Ordering::SeqCst);
                    let shared = self.spawn(key.clone(), generation, compute());
                    slots.insert(
                        key.clone(),
                        Slot::Pending {
                            generation,
                            started: now,
                            result: shared.clone(),
                        },
                    );
                    debug!("Cache {}: miss, computation started", key.short());
                    (shared, CacheStatus::Computed)
                }
            }
        };

        let value = shared.await?;
        Ok(Cached { value, status })
    }

    fn spawn<Fut>(&self, key: Fingerprint, generation: u64, fut: Fut) -> SharedResult<V>
    where
        Fut: Future<Output = Result<V, AnalysisError>> + Send + 'static,
    {
        let ttl = self.inner.policy.pending_ttl;
        let task_inner = Arc::clone(&self.inner);
        let task_key = key.clone();
        let handle = tokio::spawn(async move {
            let outcome = match tokio::time::timeout(ttl, fut).await {
                Ok(result) => result.map(Arc::new),
                Err(_) => Err(AnalysisError::Timeout {
                    secs: ttl.as_secs(),
                }),
            };
            task_inner.settle(&task_key, generation, &outcome);
            outcome
        });

        let inner = Arc::clone(&self.inner);
        async move {
            match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    let err = AnalysisError::Internal(format!("analysis task failed: {e}"));
                    inner.settle(&key, generation, &Err(err.clone()));
                    Err(err)
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Completed, unexpired analysis for `key`, if any.
    pub fn get(&self, key: &Fingerprint) -> Option<Arc<V>> {
        let slots = self.inner.slots();
        match slots.get(key) {
            Some(Slot::Completed { at, value })
                if self.inner.policy.completed_fresh(*at, Instant::now()) =>
            {
                Some(Arc::clone(value))
            }
            _ => None,
        }
    }

    pub fn state(&self, key: &Fingerprint) -> Option<EntryState> {
        self.inner.slots().get(key).map(|slot| match slot {
            Slot::Pending { .. } => EntryState::Pending,
            Slot::Completed { .. } => EntryState::Completed,
        })
    }

    /// Forget `key`. An in-flight computation keeps running but its result
    /// is no longer stored.
    pub fn remove(&self, key: &Fingerprint) -> bool {
        self.inner.slots().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.inner.slots().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
