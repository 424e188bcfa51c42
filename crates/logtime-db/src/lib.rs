pub mod error;
pub mod migrations;
pub mod models;
pub mod queries;

use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;

pub use error::{DbError, Result};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the logtime SQLite database.
///
/// All access goes through one connection behind a mutex, so a
/// check-then-write sequence inside [`Database::with_conn_mut`] cannot
/// interleave with another writer in this process.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;

        let db = Self::init(conn)?;
        info!("Database opened at {}", path.display());
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        migrations::run(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DbError::Unavailable(format!("DB lock poisoned: {}", e)))?;
        f(&conn)
    }

    /// Like [`Database::with_conn`] but hands out `&mut Connection` so the
    /// closure can open a transaction.
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| DbError::Unavailable(format!("DB lock poisoned: {}", e)))?;
        f(&mut conn)
    }
}
