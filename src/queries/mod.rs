//! Query layer: parameterized reads against the metadata store.
//!
//! Each query is a pure function of (store, repository selection) and does
//! no caching of its own; memoization and scheduling live in the cache
//! manager. Errors propagate to the background task runner, which records
//! them as a failed cache entry.

pub mod change_requests;

pub use change_requests::ChangeRequestsQuery;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::time::Duration;
use thiserror::Error;

use crate::database::DbPool;

pub type RepoId = i64;

/// User-chosen repositories scoping a query. Input order is preserved and
/// duplicates are dropped; cache keys use the order-insensitive
/// [`RepoSelection::normalized`] form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSelection(Vec<RepoId>);

impl RepoSelection {
    pub fn new(ids: Vec<RepoId>) -> Self {
        let mut seen = Vec::with_capacity(ids.len());
        for id in ids {
            if !seen.contains(&id) {
                seen.push(id);
            }
        }
        Self(seen)
    }

    /// Parse a comma-separated id list ("101, 102"). An empty string is a
    /// valid empty selection; anything non-numeric is rejected.
    pub fn parse(raw: &str) -> Result<Self, QueryError> {
        let mut ids = Vec::new();
        for part in raw.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let id: RepoId = part
                .parse()
                .map_err(|_| QueryError::BadSelection(format!("malformed repository id '{}'", part)))?;
            ids.push(id);
        }
        Ok(Self::new(ids))
    }

    pub fn ids(&self) -> &[RepoId] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Sorted, deduplicated ids: the order-insensitive form used in cache keys.
    pub fn normalized(&self) -> Vec<RepoId> {
        let mut ids = self.0.clone();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

/// One change request from the store. `closed_at` stays `None` while the
/// request is open.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ChangeRequestRow {
    pub change_request_id: i64,
    pub repo_id: RepoId,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

/// Tabular query result, one row per change request. Immutable once
/// produced; the cache manager owns it afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeRequestFrame {
    pub rows: Vec<ChangeRequestRow>,
}

impl ChangeRequestFrame {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid repository selection: {0}")]
    BadSelection(String),

    #[error("query timed out after {0:?}")]
    Timeout(Duration),

    #[error("query task panicked")]
    Panicked,

    #[error("background task runner unavailable")]
    RunnerUnavailable,
}

/// A named query against the metadata store. The name doubles as the query
/// identity inside cache keys, so it must be unique across queries.
#[async_trait]
pub trait Query: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(
        &self,
        db: &DbPool,
        repos: &RepoSelection,
    ) -> Result<ChangeRequestFrame, QueryError>;
}
