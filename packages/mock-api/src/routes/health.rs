use axum::{extract::Extension, Json};
use serde::Serialize;

use crate::app::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    messages: usize,
}

/// Health check endpoint
pub async fn health_handler(Extension(state): Extension<AppState>) -> Json<HealthResponse> {
    let messages = state.store.read().await.len();
    Json(HealthResponse {
        status: "ok",
        messages,
    })
}
