use axum::extract::FromRequest;

use crate::error::ApiError;

/// `axum::Json` whose rejections (bad JSON, missing fields, wrong content
/// type) are reported through [`ApiError`] like every other failure.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
