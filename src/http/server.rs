//! HTTP server for the discovery API

use axum::{
    routing::{delete, get, post},
    Router,
};
use crate::config::ServerConfig;
use crate::task::DiscoveryCoordinator;
use tower_http::cors::CorsLayer;
use tracing::info;
use super::handler::{
    analytics_handler, batch_handler, cancel_task_handler, discover_handler, discover_sync_handler,
    list_tasks_handler, rebuild_landmarks_handler, status_handler, task_status_handler,
    upsert_edge_handler, upsert_node_handler, AppState,
};

/// Routes of the discovery API
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/discover", post(discover_handler))
        .route("/api/discover/sync", post(discover_sync_handler))
        .route("/status/:task_id", get(task_status_handler))
        .route("/api/tasks", get(list_tasks_handler))
        .route("/api/tasks/:task_id", delete(cancel_task_handler))
        .route("/api/analytics", get(analytics_handler))
        .route("/api/landmarks/rebuild", post(rebuild_landmarks_handler))
        .route("/api/nodes", post(upsert_node_handler))
        .route("/api/edges", post(upsert_edge_handler))
        .route("/api/batch", post(batch_handler))
        .route("/api/status", get(status_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// HTTP server exposing one engine through its coordinator
pub struct HttpServer {
    state: AppState,
    config: ServerConfig,
}

impl HttpServer {
    /// Create a new HTTP server
    pub fn new(coordinator: DiscoveryCoordinator, config: ServerConfig) -> Self {
        Self {
            state: AppState::new(coordinator),
            config,
        }
    }

    /// Start the HTTP server
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error>> {
        let app = router(self.state.clone());

        let addr = format!("{}:{}", self.config.address, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        info!("Discovery API listening on http://{}", addr);

        axum::serve(listener, app).await?;

        Ok(())
    }
}
