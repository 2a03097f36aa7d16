/// Request extractors
///
/// [`JsonBody`] behaves like `axum::Json` but rejects with [`ApiError`], so a
/// missing content type, invalid JSON or a missing field all come back as
/// `400 bad_request` with the usual JSON error body.

use crate::error::ApiError;
use axum::extract::FromRequest;

/// JSON request body with API error rejections
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);
