use axum::{
    body::Body,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "assets"]
struct DashboardAssets;

/// Serve the dashboard page with fallback to index.html so a bookmarked
/// path still loads the app shell.
pub async fn serve_dashboard(uri: Uri) -> impl IntoResponse {
    let path = uri.path().trim_start_matches('/');

    if let Some(content) = DashboardAssets::get(path) {
        return serve_file(path, content.data.into());
    }

    if let Some(content) = DashboardAssets::get("index.html") {
        return serve_file("index.html", content.data.into());
    }

    (StatusCode::NOT_FOUND, "Dashboard assets missing from build.").into_response()
}

fn serve_file(path: &str, data: Vec<u8>) -> Response {
    let mime_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .as_ref()
        .to_string();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime_type)
        .body(Body::from(data))
        .unwrap()
}
