use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;

use crate::error::AppError;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct RepoSearchParams {
    #[serde(default)]
    pub search: Option<String>,
}

/// GET /api/repos?search=term - Repository picker options
///
/// Searches the catalog loaded at startup; an empty term returns the whole
/// catalog so the picker can populate before the user types.
pub async fn list_repos(
    State(state): State<AppState>,
    Query(params): Query<RepoSearchParams>,
) -> Result<impl IntoResponse, AppError> {
    let repos = state
        .repo_catalog
        .search(params.search.as_deref().unwrap_or(""));
    Ok((StatusCode::OK, Json(repos)))
}
