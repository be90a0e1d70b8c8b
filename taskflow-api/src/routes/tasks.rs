/// Task endpoints
///
/// # Endpoints
///
/// - `POST /api/v1/tasks` - Create a task in one of the caller's projects
/// - `GET /api/v1/tasks/project/:project_id` - List a project's tasks
/// - `GET /api/v1/tasks/:id` - Get one task
/// - `PUT /api/v1/tasks/:id` - Update a task
/// - `DELETE /api/v1/tasks/:id` - Delete a task
///
/// Every route resolves the task's project through the caller's ownership,
/// so tasks in someone else's project respond as 404. Each mutation
/// recomputes the project's progress before returning, so a read immediately
/// after a write always sees the new percentage.

use crate::{
    app::AppState,
    error::{validation_error, ApiError, ApiResult},
    routes::projects::owned_project,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use taskflow_shared::{
    auth::middleware::CurrentUser,
    models::{
        progress::Progress,
        task::{CreateTask, Task, TaskPriority, TaskStatus, UpdateTask},
        user::User,
    },
};
use validator::Validate;

/// Create request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    #[serde(default)]
    pub status: TaskStatus,

    pub due_date: Option<DateTime<Utc>>,

    pub scheduled_day: Option<DateTime<Utc>>,

    #[serde(default)]
    pub priority: TaskPriority,

    pub project_id: i64,
}

/// Update request; absent fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    pub status: Option<TaskStatus>,

    pub due_date: Option<DateTime<Utc>>,

    pub scheduled_day: Option<DateTime<Utc>>,

    pub priority: Option<TaskPriority>,
}

/// Resolves a task the caller may touch, or fails with the merged 404
///
/// A task whose project belongs to someone else reads exactly like a task
/// that does not exist.
async fn owned_task(state: &AppState, user: &User, task_id: i64) -> ApiResult<Task> {
    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    match owned_project(state, user, task.project_id).await {
        Ok(_) => Ok(task),
        Err(ApiError::NotFound(_)) => Err(ApiError::NotFound("Task not found".to_string())),
        Err(e) => Err(e),
    }
}

/// Create a task in one of the caller's projects
///
/// The target project must exist and belong to the caller; otherwise the
/// project reads as not found. Recomputes the project's progress before
/// responding (a fresh todo task lowers the percentage).
pub async fn create_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    req.validate().map_err(validation_error)?;

    owned_project(&state, &user, req.project_id).await?;

    let task = Task::create(
        &state.db,
        CreateTask {
            title: req.title,
            description: req.description,
            status: req.status,
            due_date: req.due_date,
            scheduled_day: req.scheduled_day,
            priority: req.priority,
            project_id: req.project_id,
        },
    )
    .await?;

    Progress::recompute(&state.db, task.project_id).await?;

    Ok((StatusCode::CREATED, Json(task)))
}

/// List all tasks in one of the caller's projects
pub async fn list_project_tasks(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(project_id): Path<i64>,
) -> ApiResult<Json<Vec<Task>>> {
    owned_project(&state, &user, project_id).await?;

    let tasks = Task::list_by_project(&state.db, project_id).await?;
    Ok(Json(tasks))
}

/// Get one task
pub async fn get_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(task_id): Path<i64>,
) -> ApiResult<Json<Task>> {
    let task = owned_task(&state, &user, task_id).await?;
    Ok(Json(task))
}

/// Update a task and recompute its project's progress
pub async fn update_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(task_id): Path<i64>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    req.validate().map_err(validation_error)?;

    let task = owned_task(&state, &user, task_id).await?;

    let updated = Task::update(
        &state.db,
        task.id,
        UpdateTask {
            title: req.title,
            description: req.description,
            status: req.status,
            due_date: req.due_date,
            scheduled_day: req.scheduled_day,
            priority: req.priority,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Progress::recompute(&state.db, updated.project_id).await?;

    Ok(Json(updated))
}

/// Delete a task and recompute its project's progress
///
/// Deleting the last task drops the percentage to 0.
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(task_id): Path<i64>,
) -> ApiResult<StatusCode> {
    let task = owned_task(&state, &user, task_id).await?;

    Task::delete(&state.db, task.id).await?;
    Progress::recompute(&state.db, task.project_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
