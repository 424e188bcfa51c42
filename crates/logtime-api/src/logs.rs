use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::{debug, info};

use logtime_db::models::LogRow;
use logtime_types::api::{CreateLogRequest, LogResponse};

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::run_blocking;
use crate::state::AppState;

/// POST /logs — store one message, optionally owned by a user.
pub async fn create_log(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateLogRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.message.trim().is_empty() {
        return Err(ApiError::Validation("message must not be empty".into()));
    }
    if state.require_user && req.user_id.is_none() {
        return Err(ApiError::NotFound("user_id is required".into()));
    }

    let CreateLogRequest { message, user_id } = req;
    let row = run_blocking(move || Ok(state.db.insert_log(&message, user_id)?)).await?;

    info!(log_id = row.id, user_id = ?row.user_id, "Received log: {}", row.message);

    Ok((StatusCode::CREATED, Json(to_response(row))))
}

/// GET /logs — every stored log, oldest first. Not scoped to a user.
pub async fn list_logs(State(state): State<AppState>) -> Result<Json<Vec<LogResponse>>, ApiError> {
    let rows = run_blocking(move || Ok(state.db.list_logs()?)).await?;
    debug!("Listing {} logs", rows.len());

    Ok(Json(rows.into_iter().map(to_response).collect()))
}

fn to_response(row: LogRow) -> LogResponse {
    LogResponse {
        id: row.id,
        message: row.message,
        timestamp: row.timestamp,
        user_id: row.user_id,
    }
}
