//! Cache manager: memoized query results keyed by (query, repository set).
//!
//! Each entry is a `tokio::sync::watch` channel so renderers can await the
//! completion signal instead of re-checking on a timer. The entry lifecycle
//! is Pending -> Ready | Failed, written exactly once per scheduled task;
//! a Failed entry is re-armed (and the query re-enqueued) on the next
//! request so a transient failure clears itself on refresh.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::queries::{ChangeRequestFrame, Query, QueryError, RepoId, RepoSelection};
use crate::tasks::{TaskEnvelope, TaskSubmitter};

/// Identity of a cached result: the query name plus the sorted repository
/// ids, so selections differing only in order share one entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    query: &'static str,
    repos: Vec<RepoId>,
}

impl CacheKey {
    pub fn new(query: &'static str, repos: &RepoSelection) -> Self {
        Self {
            query,
            repos: repos.normalized(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<String> = self.repos.iter().map(|id| id.to_string()).collect();
        write!(f, "{}[{}]", self.query, ids.join(","))
    }
}

/// Lifecycle of one cache entry. While `Pending`, exactly one background
/// task owns the slot and will move it to `Ready` or `Failed`.
#[derive(Debug, Clone)]
pub enum CacheState {
    Pending,
    Ready(Arc<ChangeRequestFrame>),
    Failed(Arc<QueryError>),
}

impl CacheState {
    pub fn is_pending(&self) -> bool {
        matches!(self, CacheState::Pending)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, CacheState::Ready(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, CacheState::Failed(_))
    }
}

pub struct CacheManager {
    entries: DashMap<CacheKey, watch::Sender<CacheState>>,
    submitter: TaskSubmitter,
}

impl CacheManager {
    pub fn new(submitter: TaskSubmitter) -> Self {
        Self {
            entries: DashMap::new(),
            submitter,
        }
    }

    /// Look up the entry for (query, repos), scheduling a background run on
    /// the first miss. Returns the state as of this call: `Pending` means a
    /// task is in flight and the caller should wait on [`Self::wait_ready`].
    ///
    /// The dashmap entry guard makes the miss check and the enqueue atomic,
    /// so concurrent callers produce exactly one task per key.
    pub fn get_or_schedule(&self, query: Arc<dyn Query>, repos: &RepoSelection) -> CacheState {
        let key = CacheKey::new(query.name(), repos);

        match self.entries.entry(key.clone()) {
            Entry::Occupied(occupied) => {
                let tx = occupied.get();
                let mut rearmed = false;
                tx.send_if_modified(|state| {
                    if state.is_failed() {
                        *state = CacheState::Pending;
                        rearmed = true;
                        true
                    } else {
                        false
                    }
                });
                if rearmed {
                    debug!(key = %key, "re-scheduling previously failed entry");
                    self.schedule(tx, key, query, repos);
                }
                tx.borrow().clone()
            }
            Entry::Vacant(vacant) => {
                let (tx, _rx) = watch::channel(CacheState::Pending);
                debug!(key = %key, "cache miss, scheduling query");
                self.schedule(&tx, key.clone(), query, repos);
                let state = tx.borrow().clone();
                vacant.insert(tx);
                state
            }
        }
    }

    fn schedule(
        &self,
        tx: &watch::Sender<CacheState>,
        key: CacheKey,
        query: Arc<dyn Query>,
        repos: &RepoSelection,
    ) {
        let envelope = TaskEnvelope::new(key.clone(), query, repos.clone());
        if self.submitter.submit(envelope).is_err() {
            warn!(key = %key, "task runner unavailable, marking entry failed");
            tx.send_if_modified(|state| {
                *state = CacheState::Failed(Arc::new(QueryError::RunnerUnavailable));
                true
            });
        }
    }

    /// Record the outcome of a scheduled task. Only a `Pending` entry is
    /// updated; a second completion for the same flight is dropped. Returns
    /// whether the entry transitioned.
    pub fn complete(
        &self,
        key: &CacheKey,
        outcome: Result<ChangeRequestFrame, QueryError>,
    ) -> bool {
        let Some(entry) = self.entries.get(key) else {
            warn!(key = %key, "completion for unknown cache entry dropped");
            return false;
        };

        let next = match outcome {
            Ok(frame) => CacheState::Ready(Arc::new(frame)),
            Err(err) => CacheState::Failed(Arc::new(err)),
        };

        entry.value().send_if_modified(|state| {
            if state.is_pending() {
                *state = next;
                true
            } else {
                false
            }
        })
    }

    /// Watch an entry for completion. Callers should check the initial
    /// value before awaiting changes.
    pub fn subscribe(&self, key: &CacheKey) -> Option<watch::Receiver<CacheState>> {
        self.entries.get(key).map(|entry| entry.value().subscribe())
    }

    /// Await the completion signal for an entry, up to `ceiling`. Returns
    /// immediately when the entry is already settled. A `Pending` return
    /// means the ceiling elapsed with the task still running; the task keeps
    /// going and later callers will find the settled entry.
    pub async fn wait_ready(&self, key: &CacheKey, ceiling: Duration) -> CacheState {
        let Some(mut rx) = self.subscribe(key) else {
            return CacheState::Pending;
        };

        let deadline = tokio::time::Instant::now() + ceiling;
        loop {
            let state = rx.borrow_and_update().clone();
            if !state.is_pending() {
                return state;
            }
            match tokio::time::timeout_at(deadline, rx.changed()).await {
                Ok(Ok(())) => continue,
                // Sender gone; surface the last state seen.
                Ok(Err(_)) => return rx.borrow().clone(),
                Err(_) => return CacheState::Pending,
            }
        }
    }

    pub fn state(&self, key: &CacheKey) -> Option<CacheState> {
        self.entries.get(key).map(|entry| entry.value().borrow().clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
