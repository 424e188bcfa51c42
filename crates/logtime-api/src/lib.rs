pub mod error;
pub mod extract;
pub mod logs;
pub mod state;
pub mod users;

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
};
use tracing::error;

use crate::error::ApiError;
use crate::state::AppState;

/// Key-press messages are tiny; anything past this is a broken client.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// All logtime routes, without transport layers (CORS, tracing).
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/users", post(users::register))
        .route("/logs", post(logs::create_log).get(logs::list_logs))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<&'static str, ApiError> {
    run_blocking(move || {
        state
            .db
            .ping()
            .map_err(|e| ApiError::StorageUnavailable(e.to_string()))
    })
    .await?;
    Ok("ok")
}

/// Run blocking DB or hashing work off the async runtime.
pub(crate) async fn run_blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(e.to_string())
    })?
}
