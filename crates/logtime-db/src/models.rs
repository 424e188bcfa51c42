//! Database row types — these map directly to SQLite rows.
//! Distinct from logtime-types API models to keep the DB layer independent.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct UserRow {
    pub user_id: i64,
    pub username: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRow {
    pub id: i64,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub user_id: Option<i64>,
}
