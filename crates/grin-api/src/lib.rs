pub mod pages;
pub mod routes;
pub mod state;
pub mod storage;
pub mod upload;

use std::path::PathBuf;

use axum::{Router, extract::DefaultBodyLimit, routing::{get, post}};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Filesystem locations and limits the router needs.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub images_dir: PathBuf,
    pub static_dir: PathBuf,
    pub max_upload_bytes: usize,
}

pub fn router(state: AppState, config: &RouterConfig) -> Router {
    Router::new()
        .route("/", get(routes::home))
        .route("/classify", get(routes::classify))
        .route("/history", get(routes::history))
        .route("/upload", post(routes::upload))
        .route("/health", get(routes::health))
        .nest_service("/images", ServeDir::new(&config.images_dir))
        .nest_service("/static", ServeDir::new(&config.static_dir))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
