//! HTTP endpoints over the task pool.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tracing::{debug, error};

use taskq_core::{App, StatusCounts, Task, TaskError, TaskId};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub app: Arc<App>,
}

/// Build the router with the task endpoints.
pub fn task_routes(app: Arc<App>) -> Router {
    Router::new()
        .route("/enqueue", post(enqueue))
        .route("/healthz", get(health))
        .route("/task", get(get_task))
        .route("/tasks", get(list_tasks))
        .route("/stats", get(stats))
        .with_state(AppState { app })
}

// ── Errors ──────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<TaskError> for ApiError {
    fn from(err: TaskError) -> Self {
        let status = match &err {
            TaskError::InvalidData(_) => StatusCode::BAD_REQUEST,
            TaskError::AlreadyExists(_) => StatusCode::CONFLICT,
            TaskError::NotFound(_) => StatusCode::NOT_FOUND,
            TaskError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            TaskError::InvalidTransition { .. } | TaskError::Execution { .. } => {
                error!(error = %err, "unexpected error on request path");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": state.app.healthcheck().as_str(),
    }))
}

// ── Tasks ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CreateTaskRequest {
    #[serde(default)]
    id: String,
    #[serde(default)]
    payload: String,
    #[serde(default)]
    max_retries: i64,
}

async fn enqueue(
    State(state): State<AppState>,
    body: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let Json(req) = body.map_err(|rejection| {
        debug!(error = %rejection, "rejected enqueue body");
        ApiError::bad_request("invalid JSON")
    })?;

    let max_retries = u32::try_from(req.max_retries).map_err(|_| {
        let reason = if req.max_retries < 0 {
            "max_retries must be >= 0"
        } else {
            "max_retries out of range"
        };
        ApiError::from(TaskError::InvalidData(reason.to_string()))
    })?;

    let task = state.app.submit(req.id, req.payload, max_retries).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

#[derive(Debug, Deserialize)]
struct TaskQuery {
    id: Option<String>,
}

async fn get_task(
    State(state): State<AppState>,
    Query(query): Query<TaskQuery>,
) -> Result<Json<Task>, ApiError> {
    let id = query
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("missing id parameter"))?;

    let task = state.app.get(&TaskId::new(id)).await?;
    Ok(Json(task))
}

async fn list_tasks(State(state): State<AppState>) -> Json<Vec<Task>> {
    Json(state.app.list().await)
}

async fn stats(State(state): State<AppState>) -> Json<StatusCounts> {
    Json(state.app.counts().await)
}
