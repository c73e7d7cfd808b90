//! HTTP handlers for `/todos`.
//!
//! Each handler validates its input, runs the store call on the blocking
//! pool and converts every failure into an [`ApiError`] before returning.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::error::ApiError;
use crate::store::{StoreError, TodoFilter, TodoStore};
use crate::types::{CreateTodo, DeleteConfirmation, ListParams, Todo, UpdateTodo};

pub const TITLE_REQUIRED: &str = "Title is required";
pub const TITLE_EMPTY: &str = "Title cannot be empty";
pub const DELETED: &str = "Todo deleted successfully";

/// Shared handler state: the process-wide store handle.
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn TodoStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        Self { store }
    }

    async fn run<T, F>(&self, op: F) -> Result<T, ApiError>
    where
        F: FnOnce(&dyn TodoStore) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || op(store.as_ref()))
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?
            .map_err(ApiError::from)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/todos", get(list_todos).post(create_todo))
        .route(
            "/todos/{id}",
            get(get_todo).patch(update_todo).delete(delete_todo),
        )
        .with_state(state)
}

/// Ids that are not UUIDs cannot name a stored todo.
fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound)
}

fn is_blank(title: &str) -> bool {
    title.trim().is_empty()
}

async fn list_todos(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Todo>>, ApiError> {
    let filter = TodoFilter::search(params.search.as_deref());
    let todos = state.run(move |store| store.list(&filter)).await?;
    tracing::debug!(count = todos.len(), search = ?params.search, "listed todos");
    Ok(Json(todos))
}

async fn create_todo(
    State(state): State<AppState>,
    payload: Result<Json<CreateTodo>, JsonRejection>,
) -> Result<(StatusCode, Json<Todo>), ApiError> {
    let Json(input) = payload?;
    let title = match input.title {
        Some(title) if !is_blank(&title) => title,
        _ => return Err(ApiError::Validation(TITLE_REQUIRED.to_string())),
    };
    let completed = input.completed.unwrap_or(false);

    let todo = state
        .run(move |store| store.create(&title, completed))
        .await?;
    tracing::info!(id = %todo.id, "created todo");
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn get_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Todo>, ApiError> {
    let id = parse_id(&id)?;
    state
        .run(move |store| store.get(id))
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTodo>, JsonRejection>,
) -> Result<Json<Todo>, ApiError> {
    let id = parse_id(&id)?;
    // An absent id is reported before anything about the payload.
    if state.run(move |store| store.get(id)).await?.is_none() {
        return Err(ApiError::NotFound);
    }
    let Json(patch) = payload?;
    if patch.title.as_deref().is_some_and(is_blank) {
        return Err(ApiError::Validation(TITLE_EMPTY.to_string()));
    }

    let todo = state
        .run(move |store| store.update(id, &patch))
        .await?
        .ok_or(ApiError::NotFound)?;
    tracing::info!(%id, completed = todo.completed, "updated todo");
    Ok(Json(todo))
}

async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteConfirmation>, ApiError> {
    let id = parse_id(&id)?;
    if !state.run(move |store| store.delete(id)).await? {
        return Err(ApiError::NotFound);
    }
    tracing::info!(%id, "deleted todo");
    Ok(Json(DeleteConfirmation {
        message: DELETED.to_string(),
    }))
}
