use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use tower_http::timeout::TimeoutLayer;

use crate::handlers::wallpapers;
use crate::state::AppState;

/// Wallpaper routes mounted at `/wallpapers`.
///
/// ```text
/// GET    /                  -> list_wallpapers
/// GET    /{id}              -> get_wallpaper
/// POST   /upload            -> upload_wallpaper
/// POST   /analyze           -> analyze_wallpaper
/// ```
///
/// Only the gallery reads carry the request timeout. Upload and analyze are
/// bounded by the upstream client timeout instead, and an upload that has
/// started always runs to completion or failure.
pub fn router(request_timeout: Duration) -> Router<AppState> {
    let reads = Router::new()
        .route("/", get(wallpapers::list_wallpapers))
        .route("/{id}", get(wallpapers::get_wallpaper))
        .route_layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ));

    Router::new()
        .route("/upload", post(wallpapers::upload_wallpaper))
        .route("/analyze", post(wallpapers::analyze_wallpaper))
        .merge(reads)
}
