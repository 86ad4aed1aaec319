pub mod repos;
pub mod viz;

use axum::{routing::get, Router};

use crate::server::AppState;

/// Create the API router with all endpoint routes
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/viz", get(viz::list_visualizations))
        .route("/viz/:viz_id/about", get(viz::get_about))
        .route("/viz/:viz_id/figure", get(viz::get_figure))
        .route("/repos", get(repos::list_repos))
}
