// rest/routes/tasks.rs — Task board routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::board::error::BoardError;
use crate::board::model::{CreateTask, ReorderRequest, Task, TaskPatch};
use crate::AppContext;

type ApiError = (StatusCode, Json<Value>);

fn error_reply(e: BoardError) -> ApiError {
    match &e {
        BoardError::Validation { field, message } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": message, "field": field })),
        ),
        BoardError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Task not found" })),
        ),
        BoardError::Storage(_) | BoardError::Corrupt { .. } => {
            tracing::error!(err = %e, "storage failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal error" })),
            )
        }
    }
}

pub async fn list_tasks(State(ctx): State<Arc<AppContext>>) -> Result<Json<Vec<Task>>, ApiError> {
    ctx.board.list_tasks().await.map(Json).map_err(error_reply)
}

pub async fn create_task(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<CreateTask>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let task = ctx.board.create_task(body).await.map_err(error_reply)?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
    Json(body): Json<TaskPatch>,
) -> Result<Json<Task>, ApiError> {
    ctx.board
        .update_task(&id, body)
        .await
        .map(Json)
        .map_err(error_reply)
}

pub async fn delete_task(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    ctx.board.delete_task(&id).await.map_err(error_reply)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reorder(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<ReorderRequest>,
) -> Result<StatusCode, ApiError> {
    ctx.board.reorder(body).await.map_err(error_reply)?;
    Ok(StatusCode::NO_CONTENT)
}
