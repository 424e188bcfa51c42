use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

use logtime_db::DbError;
use logtime_types::api::ErrorResponse;

/// Every failure a handler can report. Each variant maps to one status code
/// and one stable `error` code in the JSON body.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed or empty input, rejected before any write.
    #[error("{0}")]
    Validation(String),

    /// The body was not JSON, lacked a field, or had the wrong content type.
    /// Keeps the extractor's status (400, 415 or 422).
    #[error("{message}")]
    InvalidBody { status: StatusCode, message: String },

    /// A referenced user does not exist.
    #[error("{0}")]
    NotFound(String),

    /// A write would break username uniqueness.
    #[error("{0}")]
    Conflict(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidBody { status, .. } => *status,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            // Duplicate usernames are a 400 on this API, not a 409.
            ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) | ApiError::InvalidBody { .. } => "validation",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::StorageUnavailable(_) => "storage_unavailable",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::UsernameTaken => ApiError::Conflict("username already exists".into()),
            DbError::UserNotFound(id) => ApiError::NotFound(format!("user {} not found", id)),
            DbError::Unavailable(msg) => ApiError::StorageUnavailable(msg),
            e @ (DbError::CorruptRow(_) | DbError::Sqlite(_)) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Don't leak storage internals to the caller.
        let message = match &self {
            ApiError::Internal(detail) => {
                error!("Request failed: {}", detail);
                "internal server error".to_string()
            }
            ApiError::StorageUnavailable(detail) => {
                error!("Storage unavailable: {}", detail);
                "storage unavailable".to_string()
            }
            other => {
                warn!(code = other.code(), "Rejected request: {}", other);
                other.to_string()
            }
        };

        (
            status,
            Json(ErrorResponse {
                error: self.code().to_string(),
                message,
            }),
        )
            .into_response()
    }
}
