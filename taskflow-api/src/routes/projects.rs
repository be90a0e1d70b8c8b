/// Project endpoints, all scoped to the authenticated owner
///
/// # Endpoints
///
/// - `POST /api/v1/projects` - Create a project
/// - `GET /api/v1/projects` - List the caller's projects
/// - `GET /api/v1/projects/:id` - Get one project
/// - `PUT /api/v1/projects/:id` - Update a project
/// - `DELETE /api/v1/projects/:id` - Delete a project (tasks cascade)
///
/// Every lookup filters on the caller's ownership, so a project owned by
/// someone else responds as 404.

use crate::{
    app::AppState,
    error::{validation_error, ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use taskflow_shared::{
    auth::{
        authorization::{check_project_access, ProjectAccess},
        middleware::CurrentUser,
    },
    models::{
        project::{CreateProject, Project, UpdateProject},
        user::User,
    },
};
use validator::Validate;

/// Create request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
}

/// Update request; absent fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
}

/// Resolves an owner-scoped project or fails with the merged 404
pub(crate) async fn owned_project(
    state: &AppState,
    user: &User,
    project_id: i64,
) -> ApiResult<Project> {
    match check_project_access(&state.db, user, project_id).await? {
        ProjectAccess::Found(project) => Ok(project),
        ProjectAccess::NotFoundOrForbidden => {
            Err(ApiError::NotFound("Project not found".to_string()))
        }
    }
}

/// Create a new project owned by the caller
pub async fn create_project(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    req.validate().map_err(validation_error)?;

    let project = Project::create(
        &state.db,
        CreateProject {
            name: req.name,
            description: req.description,
            owner_id: user.id,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(project)))
}

/// List the caller's projects, newest first
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<Project>>> {
    let projects = Project::list_by_owner(&state.db, user.id).await?;
    Ok(Json(projects))
}

/// Get one of the caller's projects
pub async fn get_project(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(project_id): Path<i64>,
) -> ApiResult<Json<Project>> {
    let project = owned_project(&state, &user, project_id).await?;
    Ok(Json(project))
}

/// Update one of the caller's projects
pub async fn update_project(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(project_id): Path<i64>,
    Json(req): Json<UpdateProjectRequest>,
) -> ApiResult<Json<Project>> {
    req.validate().map_err(validation_error)?;

    // Ownership check first; the update itself has no owner filter
    owned_project(&state, &user, project_id).await?;

    let updated = Project::update(
        &state.db,
        project_id,
        UpdateProject {
            name: req.name,
            description: req.description,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Ok(Json(updated))
}

/// Delete one of the caller's projects
///
/// Tasks and the progress row go with it via ON DELETE CASCADE.
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(project_id): Path<i64>,
) -> ApiResult<StatusCode> {
    owned_project(&state, &user, project_id).await?;

    Project::delete(&state.db, project_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
