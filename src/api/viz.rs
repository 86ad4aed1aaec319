use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};

use crate::cache::{CacheKey, CacheState};
use crate::error::AppError;
use crate::queries::RepoSelection;
use crate::server::AppState;
use crate::viz::{figure, FigureKey, Interval, Visualization};

/// GET /api/viz - List the dashboard's visualization cards
pub async fn list_visualizations(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    Ok((StatusCode::OK, Json(state.visualizations.descriptors())))
}

#[derive(Debug, Serialize)]
pub struct VizAbout {
    pub id: &'static str,
    pub title: &'static str,
    pub about: &'static str,
}

/// GET /api/viz/:viz_id/about - Popover text for one visualization
pub async fn get_about(
    State(state): State<AppState>,
    Path(viz_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let viz = lookup(&state, &viz_id)?;
    Ok((
        StatusCode::OK,
        Json(VizAbout {
            id: viz.id(),
            title: viz.title(),
            about: viz.about(),
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct FigureParams {
    #[serde(default)]
    pub repos: Option<String>,
    #[serde(default)]
    pub interval: Option<String>,
}

/// GET /api/viz/:viz_id/figure?repos=101,102&interval=M - Render one figure
///
/// Always answers 200 with figure JSON for a valid request: real data when
/// the underlying frame is ready, the no-data placeholder for an empty
/// result, and the failure placeholder when the query failed or the wait
/// ceiling elapsed first. The background task keeps running in the latter
/// case, so a retry usually finds the frame cached.
pub async fn get_figure(
    State(state): State<AppState>,
    Path(viz_id): Path<String>,
    Query(params): Query<FigureParams>,
) -> Result<impl IntoResponse, AppError> {
    let viz = lookup(&state, &viz_id)?;
    let selection = RepoSelection::parse(params.repos.as_deref().unwrap_or(""))?;
    let interval = match params.interval.as_deref() {
        Some(raw) => Interval::parse(raw)?,
        None => Interval::default(),
    };

    let figure_key = FigureKey::new(viz.id(), &selection, interval);
    if let Some(cached) = state.figures.get(&figure_key).await {
        debug!(viz_id = viz.id(), "figure cache hit");
        return Ok((StatusCode::OK, Json((*cached).clone())));
    }

    let query = viz.query();
    let frame_key = CacheKey::new(query.name(), &selection);
    let settled = match state.cache.get_or_schedule(query, &selection) {
        CacheState::Pending => {
            state
                .cache
                .wait_ready(&frame_key, state.config.data_wait_timeout())
                .await
        }
        other => other,
    };

    let figure = match settled {
        CacheState::Ready(frame) if frame.is_empty() => {
            warn!(viz_id = viz.id(), key = %frame_key, "no data for selection");
            figure::placeholder_no_data()
        }
        CacheState::Ready(frame) => {
            let started = Instant::now();
            let figure = viz.build(&frame, interval);
            debug!(
                viz_id = viz.id(),
                key = %frame_key,
                rows = frame.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "figure built"
            );
            state
                .figures
                .insert(figure_key, Arc::new(figure.clone()))
                .await;
            figure
        }
        CacheState::Failed(err) => {
            error!(viz_id = viz.id(), key = %frame_key, error = %err, "query failed");
            figure::placeholder_load_failed()
        }
        CacheState::Pending => {
            warn!(
                viz_id = viz.id(),
                key = %frame_key,
                "data wait ceiling elapsed before completion"
            );
            figure::placeholder_load_failed()
        }
    };

    Ok((StatusCode::OK, Json(figure)))
}

fn lookup(state: &AppState, viz_id: &str) -> Result<Arc<dyn Visualization>, AppError> {
    state
        .visualizations
        .get(viz_id)
        .ok_or_else(|| AppError::UnknownVisualization(viz_id.to_string()))
}
