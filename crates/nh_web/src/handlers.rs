use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::io::ErrorKind;
use std::sync::Arc;

use crate::AppState;

/// Serves the store file byte for byte as an attachment.
pub async fn download_news_data(State(state): State<Arc<AppState>>) -> Response {
    match tokio::fs::read(state.path()).await {
        Ok(bytes) => {
            let disposition = format!("attachment; filename=\"{}\"", state.file_name());
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                bytes,
            )
                .into_response()
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::warn!("News data requested before {} exists", state.path().display());
            (StatusCode::NOT_FOUND, "news data not available yet").into_response()
        }
        Err(e) => {
            tracing::error!("Failed to read {}: {}", state.path().display(), e);
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to read news data").into_response()
        }
    }
}
