/// User endpoints
///
/// - `GET /api/v1/users/self` - The caller's profile
/// - `GET /api/v1/users/:id` - A profile within the admin's scope
/// - `GET /api/v1/users` - All `normal` users within the admin's scope

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use dutyroster_shared::auth::middleware::Identity;
use dutyroster_shared::services::UserProfile;
use uuid::Uuid;

/// Profile of the authenticated caller
pub async fn get_self(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<UserProfile>> {
    let profile = state.users().get_self(&identity).await?;
    Ok(Json(profile))
}

/// Profile of one user
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not an admin, or the user is out of scope
/// - `404 Not Found`: No such user
pub async fn get_user(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<UserProfile>> {
    let profile = state.users().get_user(&identity, user_id).await?;
    Ok(Json(profile))
}

/// Users an admin can assign tasks to
pub async fn list_users(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<Vec<UserProfile>>> {
    let users = state.users().list_accessible(&identity).await?;
    Ok(Json(users))
}
