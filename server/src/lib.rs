//! Todo REST service.
//!
//! # Overview
//! Serves create/read/update/delete over `/todos` as JSON, backed by a
//! single SQLite connection that is opened once and shared by all requests.
//!
//! # Design
//! - `store` owns persistence behind the `TodoStore` trait.
//! - `api` holds the axum handlers; each one maps failures to `ApiError`.
//! - `config` is only used by the binary but lives here so it can be tested.

pub mod api;
pub mod config;
pub mod error;
pub mod store;
pub mod types;

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

pub use api::AppState;
pub use config::ServerConfig;
pub use error::{ApiError, ErrorBody};
pub use store::{SqliteStore, StoreError, TodoFilter, TodoStore};
pub use types::{CreateTodo, DeleteConfirmation, Todo, UpdateTodo};

pub fn app(store: Arc<dyn TodoStore>) -> Router {
    api::router(AppState::new(store)).layer(TraceLayer::new_for_http())
}

pub async fn run(listener: TcpListener, store: Arc<dyn TodoStore>) -> Result<(), std::io::Error> {
    axum::serve(listener, app(store)).await
}
