//! HTTP handlers for the discovery API

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Json, Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use crate::algo::SearchBudget;
use crate::discovery::DiscoveryRequest;
use crate::engine::Engine;
use crate::error::{EngineError, EngineResult, ErrorBody, ErrorKind};
use crate::graph::{EdgeInput, GraphMutation, NodeInput};
use crate::task::DiscoveryCoordinator;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Shared state of every handler
#[derive(Clone)]
pub struct AppState {
    pub coordinator: DiscoveryCoordinator,
}

impl AppState {
    pub fn new(coordinator: DiscoveryCoordinator) -> Self {
        Self { coordinator }
    }

    fn engine(&self) -> Arc<Engine> {
        Arc::clone(self.coordinator.engine())
    }
}

fn status_code(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::Cancelled => StatusCode::CONFLICT,
        ErrorKind::NoPathFound | ErrorKind::Truncated | ErrorKind::GraphInconsistency => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let body = ErrorBody::from(&self);
        (status_code(body.kind), Json(json!({ "error": body }))).into_response()
    }
}

// Malformed bodies and path segments answer with the same error envelope
impl From<JsonRejection> for EngineError {
    fn from(rejection: JsonRejection) -> Self {
        EngineError::InvalidInput(rejection.body_text())
    }
}

impl From<PathRejection> for EngineError {
    fn from(rejection: PathRejection) -> Self {
        EngineError::InvalidInput(rejection.body_text())
    }
}

/// Run blocking engine work off the async executor
async fn blocking<T, F>(f: F) -> EngineResult<T>
where
    F: FnOnce() -> EngineResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| EngineError::GraphInconsistency(format!("worker aborted: {}", e)))?
}

/// Queue a discovery and return its task id
pub async fn discover_handler(
    State(state): State<AppState>,
    body: Result<Json<DiscoveryRequest>, JsonRejection>,
) -> Result<impl IntoResponse, EngineError> {
    let Json(request) = body?;
    let task_id = state.coordinator.submit(request)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "task_id": task_id, "status": "queued" })),
    ))
}

/// Run a discovery and answer with the result directly
pub async fn discover_sync_handler(
    State(state): State<AppState>,
    body: Result<Json<DiscoveryRequest>, JsonRejection>,
) -> Result<impl IntoResponse, EngineError> {
    let Json(request) = body?;
    let response = state.coordinator.run(request).await?;
    Ok(Json(response))
}

/// Handler for task polling
pub async fn task_status_handler(
    State(state): State<AppState>,
    task_id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, EngineError> {
    let Path(task_id) = task_id?;
    Ok(Json(state.coordinator.status(task_id)?))
}

pub async fn cancel_task_handler(
    State(state): State<AppState>,
    task_id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, EngineError> {
    let Path(task_id) = task_id?;
    let status = state.coordinator.cancel(task_id)?;
    Ok(Json(json!({ "task_id": task_id, "status": status })))
}

pub async fn list_tasks_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.coordinator.list())
}

/// Network report for the current graph version
pub async fn analytics_handler(State(state): State<AppState>) -> Result<impl IntoResponse, EngineError> {
    let engine = state.engine();
    let report = blocking(move || engine.network_report()).await?;
    Ok(Json(report.as_ref().clone()))
}

pub async fn rebuild_landmarks_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, EngineError> {
    let engine = state.engine();
    let index = blocking(move || engine.rebuild_landmarks(&SearchBudget::unlimited())).await?;
    Ok(Json(json!({
        "landmarks": index.landmark_ids(),
        "graph_version": index.built_version(),
    })))
}

pub async fn upsert_node_handler(
    State(state): State<AppState>,
    body: Result<Json<NodeInput>, JsonRejection>,
) -> Result<impl IntoResponse, EngineError> {
    let Json(input) = body?;
    let id = input.id.clone();
    let engine = state.engine();
    let version = blocking(move || {
        engine.upsert_node(input)?;
        Ok(engine.snapshot().version())
    })
    .await?;
    Ok(Json(json!({ "id": id, "graph_version": version })))
}

pub async fn upsert_edge_handler(
    State(state): State<AppState>,
    body: Result<Json<EdgeInput>, JsonRejection>,
) -> Result<impl IntoResponse, EngineError> {
    let Json(input) = body?;
    let engine = state.engine();
    let (edge_id, version) = blocking(move || {
        let edge_id = engine.upsert_edge(input)?;
        Ok((edge_id, engine.snapshot().version()))
    })
    .await?;
    Ok(Json(json!({ "edge_id": edge_id.as_u64(), "graph_version": version })))
}

/// Apply several upserts atomically
pub async fn batch_handler(
    State(state): State<AppState>,
    body: Result<Json<Vec<GraphMutation>>, JsonRejection>,
) -> Result<impl IntoResponse, EngineError> {
    let Json(mutations) = body?;
    let engine = state.engine();
    let (applied, version) = blocking(move || {
        let applied = engine.apply_batch(mutations)?;
        Ok((applied, engine.snapshot().version()))
    })
    .await?;
    Ok(Json(json!({ "applied": applied, "graph_version": version })))
}

/// Handler for system status
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.engine().stats();
    Json(json!({
        "status": "healthy",
        "version": crate::VERSION,
        "graph": stats,
    }))
}
