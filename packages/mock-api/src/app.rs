//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Extension},
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::MockConfig;
use crate::routes::{
    health_handler, link_preview_handler, list_messages_handler, send_message_handler,
    upload_handler,
};
use crate::store::Store;

/// Largest request body accepted by `/upload`.
const UPLOAD_BODY_LIMIT: usize = 25 * 1024 * 1024;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<MockConfig>,
    pub store: Arc<RwLock<Store>>,
}

impl AppState {
    /// State holding the seeded demo conversation.
    pub fn new(config: MockConfig) -> Self {
        Self::with_store(config, Store::seeded())
    }

    pub fn with_store(config: MockConfig, store: Store) -> Self {
        Self {
            config: Arc::new(config),
            store: Arc::new(RwLock::new(store)),
        }
    }
}

/// Build the axum router
pub fn build_router(state: AppState) -> Router {
    let uploads = ServeDir::new(&state.config.upload_dir);

    Router::new()
        .route(
            "/messages",
            get(list_messages_handler).post(send_message_handler),
        )
        .route(
            "/upload",
            post(upload_handler).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/link-preview", get(link_preview_handler))
        .route("/health", get(health_handler))
        .nest_service("/uploads", uploads)
        .layer(Extension(state))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Serve the router on an already bound listener until the process stops.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, build_router(state)).await
}
