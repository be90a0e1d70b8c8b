/// Admin endpoints: dashboard stats, cross-user management, audit logs
///
/// # Endpoints
///
/// - `GET /api/v1/admin/stats` - Dashboard counters and recent entities
/// - `GET /api/v1/admin/users` - List users with search + pagination
/// - `PATCH /api/v1/admin/users/:id/admin` - Grant or revoke the admin role
/// - `PATCH /api/v1/admin/users/:id/suspend` - Suspend or unsuspend a user
/// - `POST /api/v1/admin/users/:id/reset-password` - Set a new password
/// - `DELETE /api/v1/admin/users/:id` - Delete a user
/// - `GET /api/v1/admin/projects` - List all projects with task counts
/// - `DELETE /api/v1/admin/projects/:id` - Delete any project
/// - `GET /api/v1/admin/projects/:id/tasks` - List any project's tasks
/// - `GET /api/v1/admin/tasks` - List all tasks
/// - `DELETE /api/v1/admin/tasks/:id` - Delete any task
/// - `GET /api/v1/admin/logs` - Audit log, newest first
///
/// All routes require the admin role. Every mutation appends exactly one
/// audit record, after the mutation commits.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::users::{clamp_page, UserResponse},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use taskflow_shared::{
    auth::{authorization::require_admin, middleware::CurrentUser, password},
    models::{
        admin_log::AdminLog,
        progress::Progress,
        project::{Project, ProjectWithTaskCount},
        task::Task,
        user::{UpdateUser, User, UserRole},
    },
};

/// Dashboard stats response
#[derive(Debug, Serialize)]
pub struct AdminStatsResponse {
    pub total_users: i64,
    pub total_projects: i64,
    pub total_tasks: i64,
    pub recent_users: Vec<UserResponse>,
    pub recent_projects: Vec<Project>,
    pub tasks_completed_today: i64,
    pub tasks_due_today: i64,
}

/// Pagination query shared by the admin listings
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Search + pagination query for the user listing
#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub q: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct PagedResponse<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

#[derive(Debug, Deserialize)]
pub struct ToggleAdminRequest {
    pub is_admin: bool,
}

#[derive(Debug, Deserialize)]
pub struct ToggleSuspendRequest {
    pub is_suspended: bool,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Dashboard counters and the five most recent users and projects
pub async fn get_stats(
    State(state): State<AppState>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
) -> ApiResult<Json<AdminStatsResponse>> {
    require_admin(&caller)?;

    let total_users = User::count(&state.db).await?;
    let total_projects = Project::count(&state.db).await?;
    let total_tasks = Task::count(&state.db).await?;
    let recent_users = User::list_recent(&state.db, 5).await?;
    let recent_projects = Project::list_recent(&state.db, 5).await?;
    let tasks_completed_today = Task::count_completed_today(&state.db).await?;
    let tasks_due_today = Task::count_due_today(&state.db).await?;

    Ok(Json(AdminStatsResponse {
        total_users,
        total_projects,
        total_tasks,
        recent_users: recent_users.into_iter().map(Into::into).collect(),
        recent_projects,
        tasks_completed_today,
        tasks_due_today,
    }))
}

/// List all users with optional search
pub async fn list_users(
    State(state): State<AppState>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Query(query): Query<UserListQuery>,
) -> ApiResult<Json<PagedResponse<UserResponse>>> {
    require_admin(&caller)?;

    let (page, per_page) = clamp_page(query.page, query.per_page, 20);
    let result = User::search(
        &state.db,
        query.q.as_deref(),
        per_page,
        (page - 1) * per_page,
    )
    .await?;

    Ok(Json(PagedResponse {
        items: result.items.into_iter().map(Into::into).collect(),
        total: result.total,
        page,
        per_page,
    }))
}

/// Grant or revoke the admin role
pub async fn toggle_admin(
    State(state): State<AppState>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(user_id): Path<i64>,
    Json(req): Json<ToggleAdminRequest>,
) -> ApiResult<Json<UserResponse>> {
    require_admin(&caller)?;

    let updated = User::update(
        &state.db,
        user_id,
        UpdateUser {
            role: Some(UserRole::from_is_admin(req.is_admin)),
            ..Default::default()
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    AdminLog::record(
        &state.db,
        caller.id,
        "admin_toggle",
        "user",
        user_id,
        Some(json!({ "is_admin": req.is_admin })),
    )
    .await?;

    Ok(Json(updated.into()))
}

/// Suspend or unsuspend a user
pub async fn toggle_suspend(
    State(state): State<AppState>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(user_id): Path<i64>,
    Json(req): Json<ToggleSuspendRequest>,
) -> ApiResult<Json<UserResponse>> {
    require_admin(&caller)?;

    let updated = User::update(
        &state.db,
        user_id,
        UpdateUser {
            is_suspended: Some(req.is_suspended),
            ..Default::default()
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    AdminLog::record(
        &state.db,
        caller.id,
        "suspend_toggle",
        "user",
        user_id,
        Some(json!({ "is_suspended": req.is_suspended })),
    )
    .await?;

    Ok(Json(updated.into()))
}

/// Set a new password for a user
///
/// The new credential is always stored hashed, regardless of what the
/// account held before.
pub async fn reset_password(
    State(state): State<AppState>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(user_id): Path<i64>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    require_admin(&caller)?;

    let hashed = password::hash_password(&req.new_password)?;

    User::update(
        &state.db,
        user_id,
        UpdateUser {
            hashed_password: Some(hashed),
            ..Default::default()
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    AdminLog::record(&state.db, caller.id, "password_reset", "user", user_id, Some(json!({})))
        .await?;

    Ok(Json(MessageResponse {
        message: "Password reset successfully".to_string(),
    }))
}

/// Delete a user
///
/// An admin cannot delete their own account; removing the last admin by
/// accident would lock the dashboard.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(user_id): Path<i64>,
) -> ApiResult<StatusCode> {
    require_admin(&caller)?;

    if user_id == caller.id {
        return Err(ApiError::BadRequest("Cannot delete yourself".to_string()));
    }

    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    User::delete(&state.db, user_id).await?;

    AdminLog::record(
        &state.db,
        caller.id,
        "user_deleted",
        "user",
        user_id,
        Some(json!({ "email": user.email })),
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// List all projects with task counts
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<PagedResponse<ProjectWithTaskCount>>> {
    require_admin(&caller)?;

    let (page, per_page) = clamp_page(query.page, query.per_page, 20);
    let result = Project::list_with_task_counts(&state.db, per_page, (page - 1) * per_page).await?;

    Ok(Json(PagedResponse {
        items: result.items,
        total: result.total,
        page,
        per_page,
    }))
}

/// Delete any project, regardless of owner
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(project_id): Path<i64>,
) -> ApiResult<StatusCode> {
    require_admin(&caller)?;

    let project = Project::find_by_id(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Project::delete(&state.db, project_id).await?;

    AdminLog::record(
        &state.db,
        caller.id,
        "project_deleted",
        "project",
        project_id,
        Some(json!({ "name": project.name })),
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// List any project's tasks
pub async fn list_project_tasks(
    State(state): State<AppState>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(project_id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    require_admin(&caller)?;

    Project::find_by_id(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    let tasks = Task::list_by_project(&state.db, project_id).await?;
    Ok(Json(json!({ "items": tasks })))
}

/// List all tasks across projects
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<PagedResponse<Task>>> {
    require_admin(&caller)?;

    let (page, per_page) = clamp_page(query.page, query.per_page, 100);
    let result = Task::list_paged(&state.db, per_page, (page - 1) * per_page).await?;

    Ok(Json(PagedResponse {
        items: result.items,
        total: result.total,
        page,
        per_page,
    }))
}

/// Delete any task
///
/// Recomputes the owning project's progress before responding, same as the
/// owner-facing delete.
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(task_id): Path<i64>,
) -> ApiResult<StatusCode> {
    require_admin(&caller)?;

    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Task::delete(&state.db, task_id).await?;
    Progress::recompute(&state.db, task.project_id).await?;

    AdminLog::record(
        &state.db,
        caller.id,
        "task_deleted",
        "task",
        task_id,
        Some(json!({ "title": task.title })),
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Audit log, newest first
pub async fn list_logs(
    State(state): State<AppState>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<PagedResponse<AdminLog>>> {
    require_admin(&caller)?;

    let (page, per_page) = clamp_page(query.page, query.per_page, 50);
    let result = AdminLog::list_paged(&state.db, per_page, (page - 1) * per_page).await?;

    Ok(Json(PagedResponse {
        items: result.items,
        total: result.total,
        page,
        per_page,
    }))
}
