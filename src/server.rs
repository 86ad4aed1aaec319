use axum::{extract::State, http::Method, response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::{
    api::create_api_router,
    assets::serve_dashboard,
    cache::CacheManager,
    config::Config,
    database::{repos::RepoCatalog, DbPool},
    error::Result,
    tasks::{task_channel, TaskRunner},
    viz::{FigureCache, VizRegistry},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub db: DbPool,
    pub cache: Arc<CacheManager>,
    pub visualizations: Arc<VizRegistry>,
    pub repo_catalog: Arc<RepoCatalog>,
    pub figures: Arc<FigureCache>,
}

/// Assemble the full application router over a prepared state.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
        .allow_origin(axum::http::header::HeaderValue::from_static("*"));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", create_api_router())
        .fallback(serve_dashboard)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn run_server(config: Config) -> Result<()> {
    // Initialize database
    let db = crate::database::create_pool(&config.database_url()).await?;

    // Initialize the task queue and the cache manager that owns its submit side
    let (submitter, receiver) = task_channel();
    let cache = Arc::new(CacheManager::new(submitter));

    // Start the background worker pool draining the queue into the cache
    let runner = TaskRunner::start(
        db.clone(),
        Arc::clone(&cache),
        receiver,
        config.workers,
        config.task_time_limit(),
    );

    // Register visualizations and load the repository picker catalog
    let visualizations = Arc::new(VizRegistry::with_defaults());
    let repo_catalog = Arc::new(RepoCatalog::load(&db).await?);
    info!(
        visualizations = visualizations.len(),
        repositories = repo_catalog.len(),
        "dashboard catalog ready"
    );

    let state = AppState {
        config: config.clone(),
        db: db.clone(),
        cache,
        visualizations,
        repo_catalog,
        figures: Arc::new(FigureCache::with_defaults()),
    };

    let app = build_router(state);

    let address = config.server_address();
    info!("Server listening on {}", address);

    let listener = tokio::net::TcpListener::bind(&address).await?;

    match axum::serve(listener, app).await {
        Ok(_) => info!("Server stopped gracefully"),
        Err(e) => error!("Server error: {}", e),
    }

    runner.shutdown().await;
    crate::database::close_pool(db).await;

    Ok(())
}

async fn health_check(State(state): State<AppState>) -> Result<Json<Value>> {
    // Test database connection
    let db_version = match crate::database::schema::get_database_info(&state.db).await {
        Ok(version) => version,
        Err(e) => {
            error!("Database health check failed: {}", e);
            return Ok(Json(json!({
                "status": "unhealthy",
                "service": "pulseboard",
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "error": "Database connection failed"
            })));
        }
    };

    Ok(Json(json!({
        "status": "healthy",
        "service": "pulseboard",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "database": {
            "version": db_version,
            "status": "connected"
        }
    })))
}
