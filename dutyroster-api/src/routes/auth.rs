/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/v1/register` - Register a user and get a token
/// - `POST /api/v1/login` - Login and get a token
///
/// Both respond with:
///
/// ```json
/// { "jwt": "eyJ...", "type": "normal", "id": "uuid" }
/// ```

use crate::{app::AppState, error::ApiResult, extract::JsonBody};
use axum::{extract::State, Json};
use dutyroster_shared::services::{LoginRequest, RegisterRequest, Session};
use validator::Validate;

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/register
/// Content-Type: application/json
///
/// {
///   "username": "jdoe",
///   "password": "correct horse",
///   "type": "normal",
///   "unit": 1, "depot": 2, "platoon": 5, "section": 9, "man": 3,
///   "first_name": "John", "last_name": "Doe", "rank": "CPL"
/// }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Field validation failed
/// - `400 Bad Request`: A `normal` user was given a wildcard level
/// - `409 Conflict`: Username already exists
pub async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> ApiResult<Json<Session>> {
    req.validate()?;

    let session = state.accounts().register(req).await?;
    Ok(Json(session))
}

/// Login with username and password
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown username or wrong password
pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> ApiResult<Json<Session>> {
    req.validate()?;

    let session = state.accounts().login(req).await?;
    Ok(Json(session))
}
