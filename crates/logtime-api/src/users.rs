use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::info;

use logtime_types::api::{RegisterRequest, UserResponse};

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::run_blocking;
use crate::state::AppState;

const MAX_USERNAME_LEN: usize = 64;

/// POST /users — register a user. Usernames are unique; a taken name is
/// reported as a conflict.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate(&req)?;

    let user = run_blocking(move || {
        let password_hash = hash_password(&req.password)?;
        Ok(state.db.create_user(&req.username, &password_hash)?)
    })
    .await?;

    info!(user_id = user.user_id, "Registered user {}", user.username);

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            user_id: user.user_id,
            username: user.username,
        }),
    ))
}

fn validate(req: &RegisterRequest) -> Result<(), ApiError> {
    if req.username.trim().is_empty() {
        return Err(ApiError::Validation("username must not be empty".into()));
    }
    if req.username.chars().count() > MAX_USERNAME_LEN {
        return Err(ApiError::Validation(format!(
            "username must be at most {} characters",
            MAX_USERNAME_LEN
        )));
    }
    if req.password.is_empty() {
        return Err(ApiError::Validation("password must not be empty".into()));
    }
    Ok(())
}

/// Hash a password with Argon2id and a fresh random salt.
fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {}", e)))
}
