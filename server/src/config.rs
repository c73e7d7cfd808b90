//! Command-line and environment configuration for the server binary.

use std::path::PathBuf;

use clap::Parser;

use crate::store::{SqliteStore, StoreError};

/// Database path that selects an ephemeral in-memory database.
pub const IN_MEMORY: &str = ":memory:";

#[derive(Debug, Clone, Parser)]
#[command(name = "todo-server", about = "REST API for the todo list")]
pub struct ServerConfig {
    /// Interface to bind.
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// SQLite database file, or `:memory:`.
    #[arg(long, env = "DATABASE_PATH", default_value = "todos.db")]
    pub database: PathBuf,
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn open_store(&self) -> Result<SqliteStore, StoreError> {
        if self.database.as_os_str() == IN_MEMORY {
            SqliteStore::open_in_memory()
        } else {
            SqliteStore::open(&self.database)
        }
    }
}
