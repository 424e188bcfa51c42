use rusqlite::Connection;
use tracing::info;

use crate::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            user_id         INTEGER PRIMARY KEY AUTOINCREMENT,
            username        TEXT NOT NULL UNIQUE,
            password_hash   TEXT NOT NULL,
            created_at      TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS logs (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            message     TEXT NOT NULL,
            timestamp   TEXT NOT NULL,
            user_id     INTEGER REFERENCES users(user_id)
        );

        CREATE INDEX IF NOT EXISTS idx_logs_user
            ON logs(user_id);

        CREATE INDEX IF NOT EXISTS idx_logs_message
            ON logs(message);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
