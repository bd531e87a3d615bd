pub mod health;
pub mod wallpapers;

use std::time::Duration;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /wallpapers                                      gallery and upload
/// ```
pub fn api_routes(request_timeout: Duration) -> Router<AppState> {
    Router::new().nest("/wallpapers", wallpapers::router(request_timeout))
}
