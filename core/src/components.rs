//! Presentation state for the todo list: the creation form, one row per
//! todo and the search box.
//!
//! Components hold only local input state. Every server interaction goes
//! through [`ClientStore`]. Each component raises a busy flag for the
//! duration of its call and lowers it on return, whatever the outcome.

use uuid::Uuid;

use crate::http::Transport;
use crate::store::{Busy, ClientStore};
use crate::types::{Todo, UpdateTodo};

#[derive(Debug, Default)]
pub struct TodoForm {
    title: String,
    busy: bool,
}

impl TodoForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn can_submit(&self) -> bool {
        !self.busy && !self.title.trim().is_empty()
    }

    /// Blank input is ignored. Otherwise the title is sent as typed and
    /// the input is cleared once the store has handled the call.
    pub fn submit<T: Transport>(&mut self, store: &mut ClientStore<T>) {
        if !self.can_submit() {
            return;
        }
        let _busy = Busy::hold(&mut self.busy);
        store.add(&self.title);
        self.title.clear();
    }
}

/// Local state of one displayed todo.
#[derive(Debug)]
pub struct TodoRow {
    id: Uuid,
    draft: String,
    editing: bool,
    busy: bool,
}

impl TodoRow {
    pub fn new(todo: &Todo) -> Self {
        Self {
            id: todo.id,
            draft: todo.title.clone(),
            editing: false,
            busy: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn begin_edit(&mut self) {
        self.editing = true;
    }

    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.draft = draft.into();
    }

    /// Flip `completed` relative to the store's current copy.
    pub fn toggle_complete<T: Transport>(&mut self, store: &mut ClientStore<T>) {
        let Some(completed) = store.item(self.id).map(|t| t.completed) else {
            return;
        };
        let _busy = Busy::hold(&mut self.busy);
        store.update(self.id, &UpdateTodo::completed(!completed));
    }

    /// A blank draft keeps the row in edit mode and sends nothing.
    pub fn save<T: Transport>(&mut self, store: &mut ClientStore<T>) {
        if self.draft.trim().is_empty() {
            return;
        }
        let _busy = Busy::hold(&mut self.busy);
        store.update(self.id, &UpdateTodo::title(self.draft.as_str()));
        self.editing = false;
    }

    pub fn delete<T: Transport>(&mut self, store: &mut ClientStore<T>) {
        let _busy = Busy::hold(&mut self.busy);
        store.remove(self.id);
    }
}

#[derive(Debug, Default)]
pub struct SearchBox {
    query: String,
}

impl SearchBox {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query<T: Transport>(&mut self, query: impl Into<String>, store: &mut ClientStore<T>) {
        self.query = query.into();
        store.search(&self.query);
    }
}
