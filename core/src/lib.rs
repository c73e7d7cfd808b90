//! Synchronous client core for the todo service.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). On top of that,
//! `ClientStore` keeps the displayed list in step with the server and the
//! `components` module models the form, rows and search box that drive it.
//!
//! # Design
//! - `TodoClient` is stateless; it holds only `base_url`.
//! - Each CRUD operation is split into `build_*` (produces request) and
//!   `parse_*` (consumes response), so the I/O boundary is explicit.
//! - The host plugs in a `Transport` to execute requests for the store.
//! - DTOs are defined independently from the server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod components;
pub mod error;
pub mod http;
pub mod store;
pub mod types;

#[cfg(test)]
mod test_support;

pub use client::TodoClient;
pub use components::{SearchBox, TodoForm, TodoRow};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use store::ClientStore;
pub use types::{CreateTodo, DeleteConfirmation, Todo, UpdateTodo};
