use std::os::raw::c_int;

use rusqlite::ErrorCode;

/// Errors surfaced by the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// The `UNIQUE(username)` constraint rejected an insert.
    #[error("username is already taken")]
    UsernameTaken,

    /// A log referenced a user that does not exist.
    #[error("user {0} not found")]
    UserNotFound(i64),

    /// The database is busy, locked, cannot be opened, or its lock is poisoned.
    #[error("database unavailable: {0}")]
    Unavailable(String),

    /// A stored value could not be decoded.
    #[error("corrupt row: {0}")]
    CorruptRow(String),

    #[error(transparent)]
    Sqlite(rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, DbError>;

impl From<rusqlite::Error> for DbError {
    fn from(e: rusqlite::Error) -> Self {
        match e.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked | ErrorCode::CannotOpen) => {
                DbError::Unavailable(e.to_string())
            }
            _ => DbError::Sqlite(e),
        }
    }
}

/// Extended result code of a constraint violation, if `e` is one.
pub(crate) fn constraint_violation(e: &rusqlite::Error) -> Option<c_int> {
    match e {
        rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation => {
            Some(err.extended_code)
        }
        _ => None,
    }
}
