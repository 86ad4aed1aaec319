//! Short-lived cache of rendered figures.
//!
//! The frame cache already dedupes query work; this layer sits in front of
//! the per-request transform so repeated renders of the same card (several
//! browser tabs, a page refresh) skip rebuilding identical figure JSON.
//! Entries expire quickly since they are cheap to rebuild from the frame.

use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

use super::{Figure, Interval};
use crate::queries::{RepoId, RepoSelection};

const DEFAULT_CAPACITY: u64 = 64;
const DEFAULT_TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FigureKey {
    viz_id: String,
    repos: Vec<RepoId>,
    interval: Interval,
}

impl FigureKey {
    pub fn new(viz_id: &str, repos: &RepoSelection, interval: Interval) -> Self {
        Self {
            viz_id: viz_id.to_string(),
            repos: repos.normalized(),
            interval,
        }
    }
}

pub struct FigureCache {
    cache: Cache<FigureKey, Arc<Figure>>,
}

impl FigureCache {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL)
    }

    pub async fn get(&self, key: &FigureKey) -> Option<Arc<Figure>> {
        self.cache.get(key).await
    }

    pub async fn insert(&self, key: FigureKey, figure: Arc<Figure>) {
        self.cache.insert(key, figure).await;
    }
}

impl Default for FigureCache {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_then_get_returns_same_figure() {
        let cache = FigureCache::with_defaults();
        let key = FigureKey::new("duration", &RepoSelection::new(vec![2, 1]), Interval::Month);
        let figure = Arc::new(Figure::default());

        cache.insert(key.clone(), Arc::clone(&figure)).await;
        let hit = cache.get(&key).await.expect("cached figure");
        assert!(Arc::ptr_eq(&hit, &figure));
    }

    #[tokio::test]
    async fn test_key_normalizes_repo_order() {
        let cache = FigureCache::with_defaults();
        let key = FigureKey::new("duration", &RepoSelection::new(vec![2, 1]), Interval::Month);
        cache.insert(key, Arc::new(Figure::default())).await;

        let reordered =
            FigureKey::new("duration", &RepoSelection::new(vec![1, 2]), Interval::Month);
        assert!(cache.get(&reordered).await.is_some());
    }

    #[tokio::test]
    async fn test_interval_and_viz_id_separate_entries() {
        let cache = FigureCache::with_defaults();
        let repos = RepoSelection::new(vec![1]);
        cache
            .insert(
                FigureKey::new("duration", &repos, Interval::Month),
                Arc::new(Figure::default()),
            )
            .await;

        assert!(cache
            .get(&FigureKey::new("duration", &repos, Interval::Year))
            .await
            .is_none());
        assert!(cache
            .get(&FigureKey::new("throughput", &repos, Interval::Month))
            .await
            .is_none());
    }
}
