/// Task endpoints
///
/// All routes live on `/api/v1/tasks` and require a bearer token.
///
/// | Method | Body | Response |
/// |---|---|---|
/// | `GET` | none | visible tasks with display names |
/// | `POST` | `{name, assigned_to}` | created task |
/// | `PUT` | `{id, name, assigned_to, completed, verified}` | updated task |
/// | `DELETE` | `{id}` | `{deleted: true, id}` |
///
/// `PUT` carries the complete desired task. Fields are compared against the
/// stored record to decide which change is being requested.

use crate::{app::AppState, error::ApiResult, extract::JsonBody};
use axum::{extract::State, http::StatusCode, Extension, Json};
use dutyroster_shared::auth::middleware::Identity;
use dutyroster_shared::lifecycle::TaskUpdate;
use dutyroster_shared::models::task::{Task, TaskView};
use dutyroster_shared::services::NewTask;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Delete task request
#[derive(Debug, Deserialize)]
pub struct DeleteTaskRequest {
    /// Task to delete
    pub id: Uuid,
}

/// Delete task response
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteTaskResponse {
    /// Always true on success
    pub deleted: bool,

    /// Deleted task
    pub id: Uuid,
}

/// Tasks visible to the caller
///
/// `normal` users see their own tasks. Admins see the tasks of every
/// `normal` user within their scope.
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<Vec<TaskView>>> {
    let tasks = state.tasks().list(&identity).await?;
    Ok(Json(tasks))
}

/// Create a task
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not an admin or the assignee is out of scope
/// - `404 Not Found`: Assignee does not exist
/// - `422 Unprocessable Entity`: Name is empty or too long
pub async fn create_task(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    JsonBody(req): JsonBody<NewTask>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    req.validate()?;

    let task = state.tasks().create(&identity, req).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// Update a task
///
/// # Errors
///
/// - `403 Forbidden`: Caller may not change the requested fields
/// - `404 Not Found`: Task or new assignee does not exist
/// - `409 Conflict`: Another write landed first
/// - `422 Unprocessable Entity`: Illegal flag change, e.g. verifying
///   incomplete work
pub async fn update_task(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    JsonBody(req): JsonBody<TaskUpdate>,
) -> ApiResult<Json<Task>> {
    req.validate()?;

    let task = state.tasks().update(&identity, req).await?;
    Ok(Json(task))
}

/// Delete a task
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    JsonBody(req): JsonBody<DeleteTaskRequest>,
) -> ApiResult<Json<DeleteTaskResponse>> {
    state.tasks().delete(&identity, req.id).await?;

    Ok(Json(DeleteTaskResponse {
        deleted: true,
        id: req.id,
    }))
}
