//! Client-side list state kept in sync with the server.
//!
//! # Design
//! `ClientStore` owns the displayed `items` and reconciles them from the
//! server's response after every mutation: a created todo is the server's
//! copy prepended, an updated todo replaces the entry with the same id, a
//! deleted todo is dropped. Nothing is changed locally before the server
//! answers.
//!
//! Failures never propagate to the caller. They are logged with their full
//! detail and recorded in `error` as a fixed, per-operation message.

use uuid::Uuid;

use crate::client::TodoClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::types::{CreateTodo, Todo, UpdateTodo};

pub const FETCH_FAILED: &str = "Failed to fetch todos";
pub const CREATE_FAILED: &str = "Failed to create todo";
pub const UPDATE_FAILED: &str = "Failed to update todo";
pub const DELETE_FAILED: &str = "Failed to delete todo";

/// Queries shorter than this (after trimming) never reach the server.
pub const MIN_SEARCH_LEN: usize = 3;

/// Sets a flag for as long as it is alive.
pub(crate) struct Busy<'a>(&'a mut bool);

impl<'a> Busy<'a> {
    pub(crate) fn hold(flag: &'a mut bool) -> Self {
        *flag = true;
        Self(flag)
    }
}

impl Drop for Busy<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

fn round_trip<T: Transport, R>(
    client: &TodoClient,
    transport: &mut T,
    request: Result<HttpRequest, ApiError>,
    parse: impl FnOnce(&TodoClient, HttpResponse) -> Result<R, ApiError>,
) -> Result<R, ApiError> {
    let response = transport.execute(request?)?;
    parse(client, response)
}

pub struct ClientStore<T> {
    client: TodoClient,
    transport: T,
    items: Vec<Todo>,
    loading: bool,
    error: Option<String>,
    search_term: String,
}

impl<T: Transport> ClientStore<T> {
    pub fn new(client: TodoClient, transport: T) -> Self {
        Self {
            client,
            transport,
            items: Vec::new(),
            loading: false,
            error: None,
            search_term: String::new(),
        }
    }

    pub fn items(&self) -> &[Todo] {
        &self.items
    }

    pub fn item(&self, id: Uuid) -> Option<&Todo> {
        self.items.iter().find(|t| t.id == id)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn client(&self) -> &TodoClient {
        &self.client
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Replace `items` with the server's list. On failure the current items
    /// stay on display. `loading` is false again when this returns.
    pub fn load(&mut self, search: Option<&str>) {
        let result = {
            let _loading = Busy::hold(&mut self.loading);
            round_trip(
                &self.client,
                &mut self.transport,
                Ok(self.client.build_list_todos(search)),
                TodoClient::parse_list_todos,
            )
        };
        match result {
            Ok(todos) => {
                tracing::debug!(count = todos.len(), ?search, "loaded todos");
                self.items = todos;
                self.error = None;
            }
            Err(err) => self.fail(FETCH_FAILED, err),
        }
    }

    /// Create a todo and prepend the server's copy. A previous error banner
    /// is left in place on success.
    pub fn add(&mut self, title: &str) {
        let request = self.client.build_create_todo(&CreateTodo::new(title));
        match round_trip(
            &self.client,
            &mut self.transport,
            request,
            TodoClient::parse_create_todo,
        ) {
            Ok(todo) => {
                tracing::debug!(id = %todo.id, "added todo");
                self.items.insert(0, todo);
            }
            Err(err) => self.fail(CREATE_FAILED, err),
        }
    }

    /// Send a partial update and replace the matching entry with the
    /// server's full record.
    pub fn update(&mut self, id: Uuid, patch: &UpdateTodo) {
        let request = self.client.build_update_todo(id, patch);
        match round_trip(
            &self.client,
            &mut self.transport,
            request,
            TodoClient::parse_update_todo,
        ) {
            Ok(updated) => {
                for todo in self.items.iter_mut().filter(|t| t.id == id) {
                    *todo = updated.clone();
                }
            }
            Err(err) => self.fail(UPDATE_FAILED, err),
        }
    }

    pub fn remove(&mut self, id: Uuid) {
        match round_trip(
            &self.client,
            &mut self.transport,
            Ok(self.client.build_delete_todo(id)),
            TodoClient::parse_delete_todo,
        ) {
            Ok(_) => self.items.retain(|t| t.id != id),
            Err(err) => self.fail(DELETE_FAILED, err),
        }
    }

    /// Record `query` and reload when it is empty or long enough to filter.
    /// One or two characters leave the current list untouched.
    pub fn search(&mut self, query: &str) {
        self.search_term = query.to_string();
        match query.trim().chars().count() {
            0 => self.load(None),
            n if n >= MIN_SEARCH_LEN => self.load(Some(query)),
            _ => tracing::trace!(query, "search below threshold"),
        }
    }

    fn fail(&mut self, message: &str, err: ApiError) {
        tracing::warn!(error = %err, "{message}");
        self.error = Some(message.to_string());
    }
}
