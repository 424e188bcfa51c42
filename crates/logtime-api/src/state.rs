use std::sync::Arc;

use logtime_db::Database;

pub type AppState = Arc<AppStateInner>;

/// Everything the handlers share. Built once in `main` and dropped on shutdown.
pub struct AppStateInner {
    pub db: Database,
    /// Reject logs that don't name an owning user.
    pub require_user: bool,
}

impl AppStateInner {
    pub fn new(db: Database, require_user: bool) -> AppState {
        Arc::new(Self { db, require_user })
    }
}
