//! Persistence for todos.
//!
//! # Design
//! Handlers talk to a [`TodoStore`] trait object. The production
//! implementation is [`SqliteStore`]: one connection opened at startup and
//! shared behind a mutex for the lifetime of the process, so requests never
//! open connections of their own. Every call holds the lock for its whole
//! read-modify-write sequence and releases it before returning.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use thiserror::Error;
use uuid::Uuid;

use crate::types::{Todo, UpdateTodo};

/// Search terms shorter than this (after trimming) do not filter.
pub const MIN_SEARCH_LEN: usize = 3;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS todos (
    seq        INTEGER PRIMARY KEY AUTOINCREMENT,
    id         TEXT NOT NULL UNIQUE,
    title      TEXT NOT NULL,
    completed  INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS todos_created_at ON todos (created_at DESC, seq DESC);
";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error("database connection lock poisoned")]
    Poisoned,

    #[error("stored todo has invalid id {0:?}")]
    InvalidId(String),

    #[error("failed to create database directory: {0}")]
    Io(#[from] std::io::Error),
}

/// Filter applied by [`TodoStore::list`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoFilter {
    /// Lowercased, trimmed needle. `None` returns every todo.
    title_contains: Option<String>,
}

impl TodoFilter {
    pub fn all() -> Self {
        Self::default()
    }

    /// Build a filter from a raw search term. Terms under
    /// [`MIN_SEARCH_LEN`] characters after trimming are ignored.
    pub fn search(term: Option<&str>) -> Self {
        let title_contains = term
            .map(str::trim)
            .filter(|t| t.chars().count() >= MIN_SEARCH_LEN)
            .map(str::to_lowercase);
        Self { title_contains }
    }

    pub fn is_filtering(&self) -> bool {
        self.title_contains.is_some()
    }

    pub fn matches(&self, todo: &Todo) -> bool {
        match &self.title_contains {
            Some(needle) => todo.title.to_lowercase().contains(needle.as_str()),
            None => true,
        }
    }
}

/// Create/read/update/delete over the single todo record type.
pub trait TodoStore: Send + Sync {
    /// All todos matching `filter`, newest first.
    fn list(&self, filter: &TodoFilter) -> Result<Vec<Todo>, StoreError>;

    fn get(&self, id: Uuid) -> Result<Option<Todo>, StoreError>;

    fn create(&self, title: &str, completed: bool) -> Result<Todo, StoreError>;

    /// Merge `patch` onto the stored todo. `Ok(None)` if `id` is absent.
    fn update(&self, id: Uuid, patch: &UpdateTodo) -> Result<Option<Todo>, StoreError>;

    /// Hard delete. `Ok(false)` if `id` is absent.
    fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a database file and apply the schema.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let _journal_mode: String =
            conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        tracing::debug!(path = %path.display(), "opened todo database");
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

fn find(conn: &Connection, id: Uuid) -> Result<Option<Todo>, StoreError> {
    conn.query_row(
        "SELECT id, title, completed, created_at FROM todos WHERE id = ?1",
        params![id.to_string()],
        read_row,
    )
    .optional()?
    .map(into_todo)
    .transpose()
}

type RawTodo = (String, String, bool, DateTime<Utc>);

fn read_row(row: &Row<'_>) -> rusqlite::Result<RawTodo> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn into_todo((id, title, completed, created_at): RawTodo) -> Result<Todo, StoreError> {
    let id = Uuid::parse_str(&id).map_err(|_| StoreError::InvalidId(id))?;
    Ok(Todo {
        id,
        title,
        completed,
        created_at,
    })
}

impl TodoStore for SqliteStore {
    fn list(&self, filter: &TodoFilter) -> Result<Vec<Todo>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(
            "SELECT id, title, completed, created_at FROM todos
             ORDER BY created_at DESC, seq DESC",
        )?;
        let rows = stmt.query_map([], read_row)?;

        let mut todos = Vec::new();
        for row in rows {
            let todo = into_todo(row?)?;
            if filter.matches(&todo) {
                todos.push(todo);
            }
        }
        Ok(todos)
    }

    fn get(&self, id: Uuid) -> Result<Option<Todo>, StoreError> {
        find(&*self.conn()?, id)
    }

    fn create(&self, title: &str, completed: bool) -> Result<Todo, StoreError> {
        let todo = Todo {
            id: Uuid::new_v4(),
            title: title.to_string(),
            completed,
            created_at: Utc::now(),
        };
        self.conn()?.execute(
            "INSERT INTO todos (id, title, completed, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![todo.id.to_string(), todo.title, todo.completed, todo.created_at],
        )?;
        Ok(todo)
    }

    fn update(&self, id: Uuid, patch: &UpdateTodo) -> Result<Option<Todo>, StoreError> {
        let conn = self.conn()?;
        let Some(mut todo) = find(&conn, id)? else {
            return Ok(None);
        };
        patch.apply_to(&mut todo);
        conn.execute(
            "UPDATE todos SET title = ?2, completed = ?3 WHERE id = ?1",
            params![id.to_string(), todo.title, todo.completed],
        )?;
        Ok(Some(todo))
    }

    fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let removed = self
            .conn()?
            .execute("DELETE FROM todos WHERE id = ?1", params![id.to_string()])?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    #[test]
    fn create_then_get_returns_same_record() {
        let store = store();
        let created = store.create("Buy milk", false).unwrap();
        let fetched = store.get(created.id).unwrap().unwrap();
        assert_eq!(fetched, created);
    }

    #[test]
    fn title_is_stored_verbatim() {
        let store = store();
        let created = store.create("  padded  ", false).unwrap();
        assert_eq!(store.get(created.id).unwrap().unwrap().title, "  padded  ");
    }

    #[test]
    fn list_is_newest_first() {
        let store = store();
        let first = store.create("first", false).unwrap();
        let second = store.create("second", false).unwrap();
        let third = store.create("third", true).unwrap();

        let ids: Vec<Uuid> = store
            .list(&TodoFilter::all())
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![third.id, second.id, first.id]);
    }

    #[test]
    fn short_search_terms_do_not_filter() {
        let store = store();
        store.create("Buy milk", false).unwrap();
        store.create("Walk dog", false).unwrap();

        for term in ["", "a", "ab", "  ab  ", "   "] {
            let filter = TodoFilter::search(Some(term));
            assert!(!filter.is_filtering(), "{term:?}");
            assert_eq!(store.list(&filter).unwrap().len(), 2, "{term:?}");
        }
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let store = store();
        let milk = store.create("Buy MILK", false).unwrap();
        store.create("Walk dog", false).unwrap();
        let oat = store.create("oat milk latte", false).unwrap();

        let found: Vec<Uuid> = store
            .list(&TodoFilter::search(Some(" Milk ")))
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(found, vec![oat.id, milk.id]);
    }

    #[test]
    fn update_merges_supplied_fields() {
        let store = store();
        let created = store.create("Walk dog", false).unwrap();

        let patch = UpdateTodo {
            title: None,
            completed: Some(true),
        };
        let updated = store.update(created.id, &patch).unwrap().unwrap();
        assert_eq!(updated.title, "Walk dog");
        assert!(updated.completed);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(store.get(created.id).unwrap().unwrap(), updated);
    }

    #[test]
    fn missing_ids_are_reported() {
        let store = store();
        let id = Uuid::new_v4();
        assert!(store.get(id).unwrap().is_none());
        assert!(store.update(id, &UpdateTodo::default()).unwrap().is_none());
        assert!(!store.delete(id).unwrap());
    }

    #[test]
    fn delete_is_permanent() {
        let store = store();
        let created = store.create("gone", false).unwrap();
        assert!(store.delete(created.id).unwrap());
        assert!(store.get(created.id).unwrap().is_none());
        assert!(!store.delete(created.id).unwrap());
    }

    #[test]
    fn file_database_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("todos.db");

        let id = {
            let store = SqliteStore::open(&path).unwrap();
            store.create("durable", true).unwrap().id
        };

        let store = SqliteStore::open(&path).unwrap();
        let todo = store.get(id).unwrap().unwrap();
        assert_eq!(todo.title, "durable");
        assert!(todo.completed);
    }
}
