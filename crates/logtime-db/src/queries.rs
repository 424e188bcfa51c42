use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use rusqlite::ffi::{SQLITE_CONSTRAINT_FOREIGNKEY, SQLITE_CONSTRAINT_UNIQUE};
use rusqlite::{Connection, OptionalExtension};

use crate::error::constraint_violation;
use crate::models::{LogRow, UserRow};
use crate::{Database, DbError, Result};

impl Database {
    // -- Users --

    /// Insert a user. Uniqueness is left to the `UNIQUE(username)` constraint
    /// so two concurrent registrations can't both succeed.
    pub fn create_user(&self, username: &str, password_hash: &str) -> Result<UserRow> {
        let created_at = Utc::now();

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (username, password_hash, created_at) VALUES (?1, ?2, ?3)",
                (username, password_hash, format_timestamp(created_at)),
            )
            .map_err(|e| match constraint_violation(&e) {
                Some(SQLITE_CONSTRAINT_UNIQUE) => DbError::UsernameTaken,
                _ => e.into(),
            })?;

            Ok(UserRow {
                user_id: conn.last_insert_rowid(),
                username: username.to_string(),
                password_hash: password_hash.to_string(),
                created_at,
            })
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    // -- Logs --

    /// Insert a log, optionally owned by `user_id`.
    ///
    /// The owner check and the insert share one transaction on the writer
    /// connection. The timestamp is taken once the lock is held.
    pub fn insert_log(&self, message: &str, user_id: Option<i64>) -> Result<LogRow> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if let Some(uid) = user_id
                && !user_exists(&tx, uid)?
            {
                return Err(DbError::UserNotFound(uid));
            }

            let timestamp = Utc::now();
            tx.execute(
                "INSERT INTO logs (message, timestamp, user_id) VALUES (?1, ?2, ?3)",
                (message, format_timestamp(timestamp), user_id),
            )
            .map_err(|e| match (constraint_violation(&e), user_id) {
                (Some(SQLITE_CONSTRAINT_FOREIGNKEY), Some(uid)) => DbError::UserNotFound(uid),
                _ => e.into(),
            })?;
            let id = tx.last_insert_rowid();

            tx.commit()?;

            Ok(LogRow {
                id,
                message: message.to_string(),
                timestamp,
                user_id,
            })
        })
    }

    /// All logs in insertion order.
    pub fn list_logs(&self) -> Result<Vec<LogRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, message, timestamp, user_id FROM logs ORDER BY id ASC")?;

            let raw = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<i64>>(3)?,
                    ))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            raw.into_iter()
                .map(|(id, message, timestamp, user_id)| {
                    Ok(LogRow {
                        id,
                        message,
                        timestamp: parse_timestamp(&timestamp)?,
                        user_id,
                    })
                })
                .collect()
        })
    }

    /// Cheap round trip used by the health check.
    pub fn ping(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
    }
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT user_id, username, password_hash, created_at FROM users WHERE username = ?1",
    )?;

    let raw = stmt
        .query_row([username], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })
        .optional()?;

    raw.map(|(user_id, username, password_hash, created_at)| {
        Ok(UserRow {
            user_id,
            username,
            password_hash,
            created_at: parse_timestamp(&created_at)?,
        })
    })
    .transpose()
}

fn user_exists(conn: &Connection, user_id: i64) -> Result<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE user_id = ?1)",
        [user_id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Rows written by SQLite's datetime('now') have no timezone.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .map_err(|e| DbError::CorruptRow(format!("bad timestamp '{}': {}", raw, e)))
}
