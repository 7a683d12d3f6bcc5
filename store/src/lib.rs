//! SQLite-backed application state shared by every SecureScape demo.
//!
//! One [`DemoStore`] holds the accounts the CSRF demo debits, the product
//! catalog and credentials the SQL-injection demo queries, and the comment
//! board the XSS demo renders. The attack and secure routes read and write
//! the same rows; only the way they compose input into queries or output
//! differs.
//!
//! The connection sits behind a mutex, so every statement (and in particular
//! every debit) is serialized.

mod comments;
mod ledger;
mod schema;
mod sql_demo;
mod sqlite_util;

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::Connection;
use thiserror::Error;

pub use ledger::Account;
pub use schema::DemoSeed;
pub use sql_demo::{LoginAttempt, PARAMETERIZED_SEARCH_SQL, SearchOutcome};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("failed to prepare database path {path}: {source}")]
    Path {
        path: String,
        source: std::io::Error,
    },
}

/// Shared demo database.
pub struct DemoStore {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for DemoStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DemoStore").finish_non_exhaustive()
    }
}

impl DemoStore {
    /// Open or create the database at `path` with owner-only permissions.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        sqlite_util::prepare_db_path(path)?;
        let conn = Connection::open(path)?;
        tracing::info!(path = %path.display(), "Opened demo database");
        Self::initialize(conn)
    }

    /// Open an in-memory database. State lasts as long as the process.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(schema::SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    // A panicked statement leaves SQLite itself consistent, so keep going.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
