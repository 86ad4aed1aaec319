//! Change-request history for a repository selection.

use async_trait::async_trait;
use tracing::debug;

use super::{ChangeRequestFrame, ChangeRequestRow, Query, QueryError, RepoSelection};
use crate::database::DbPool;

/// Fetches every change request belonging to the selected repositories,
/// oldest first. All duration/ratio/throughput visualizations are derived
/// from this one frame, so a single cache entry serves all of them.
#[derive(Debug, Default)]
pub struct ChangeRequestsQuery;

impl ChangeRequestsQuery {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Query for ChangeRequestsQuery {
    fn name(&self) -> &'static str {
        "change_requests"
    }

    async fn run(
        &self,
        db: &DbPool,
        repos: &RepoSelection,
    ) -> Result<ChangeRequestFrame, QueryError> {
        if repos.is_empty() {
            return Ok(ChangeRequestFrame::default());
        }

        let placeholders = vec!["?"; repos.len()].join(", ");
        let sql = format!(
            "SELECT change_request_id, repo_id, created_at, closed_at
             FROM change_requests
             WHERE repo_id IN ({})
             ORDER BY created_at ASC",
            placeholders
        );

        let mut query = sqlx::query_as::<_, ChangeRequestRow>(&sql);
        for id in repos.ids() {
            query = query.bind(id);
        }
        let rows = query.fetch_all(db).await?;

        debug!(
            query = self.name(),
            repos = repos.len(),
            rows = rows.len(),
            "fetched change requests"
        );

        Ok(ChangeRequestFrame { rows })
    }
}
