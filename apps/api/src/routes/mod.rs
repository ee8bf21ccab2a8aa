pub mod health;

use axum::{extract::DefaultBodyLimit, routing::get, routing::post, Router};

use crate::analysis::handlers::handle_analyze;
use crate::state::AppState;
use crate::uploads::handlers::handle_upload;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/analyze", post(handle_analyze))
        .route(
            "/upload",
            post(handle_upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .with_state(state)
}
