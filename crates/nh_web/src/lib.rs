use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub mod handlers;
pub mod state;

pub use state::AppState;

/// Router exposing the store file at `api_path`.
pub fn create_app(state: AppState, api_path: &str) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route(api_path, get(handlers::download_news_data))
        .layer(cors)
        .with_state(Arc::new(state))
}
