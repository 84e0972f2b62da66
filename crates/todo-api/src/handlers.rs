use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use domain::{TodoId, TodoItem, TodoPayload};
use serde::Serialize;
use tracing::info;

use crate::error::ApiError;
use crate::AppState;

/// `{"message": ...}` 形式の応答
#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: &'static str,
}

/// Todo の応答形式
///
/// 文書ストア向けフロントエンドが参照する `_id` にも `id` と同じ値を入れる。
#[derive(Debug, Serialize)]
pub struct TodoResponse {
    #[serde(rename = "_id")]
    pub document_id: TodoId,
    #[serde(flatten)]
    pub item: TodoItem,
}

impl From<TodoItem> for TodoResponse {
    fn from(item: TodoItem) -> Self {
        Self {
            document_id: item.id.clone(),
            item,
        }
    }
}

/// GET /
pub async fn root() -> Json<MessageBody> {
    Json(MessageBody {
        message: "Todo List API",
    })
}

/// GET /todos
pub async fn list_todos(
    State(state): State<AppState>,
) -> Result<Json<Vec<TodoResponse>>, ApiError> {
    let todos = state.repo.list().await?;
    info!(count = todos.len(), "Listed todos");
    Ok(Json(todos.into_iter().map(TodoResponse::from).collect()))
}

/// GET /todos/:id
pub async fn get_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TodoResponse>, ApiError> {
    let todo = state.repo.get(&TodoId::from(id)).await?;
    Ok(Json(todo.into()))
}

/// POST /todos
pub async fn create_todo(
    State(state): State<AppState>,
    payload: Result<Json<TodoPayload>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let todo = state.repo.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(TodoResponse::from(todo))))
}

/// PUT /todos/:id
pub async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<TodoPayload>, JsonRejection>,
) -> Result<Json<TodoResponse>, ApiError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let todo = state.repo.update(&TodoId::from(id), &payload).await?;
    Ok(Json(todo.into()))
}

/// DELETE /todos/:id
pub async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageBody>, ApiError> {
    state.repo.delete(&TodoId::from(id)).await?;
    Ok(Json(MessageBody {
        message: "Todo deleted successfully",
    }))
}
