/// Progress endpoints (read-only)
///
/// # Endpoints
///
/// - `GET /api/v1/progress` - Progress rows for all of the caller's projects
/// - `GET /api/v1/progress/project/:project_id` - One project's progress
///
/// The completion percentage is derived state; these routes never accept a
/// value from the client. Task mutations keep it current (see
/// `routes::tasks`), and the first read of a task-less project materializes a
/// 0% row.

use crate::{app::AppState, error::ApiResult, routes::projects::owned_project};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use taskflow_shared::{auth::middleware::CurrentUser, models::progress::Progress};

/// Progress for all of the caller's projects
pub async fn list_progress(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<Progress>>> {
    let rows = Progress::list_by_owner(&state.db, user.id).await?;
    Ok(Json(rows))
}

/// Progress for one of the caller's projects
///
/// Creates the row at 0% if the project has never had a task.
pub async fn get_project_progress(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(project_id): Path<i64>,
) -> ApiResult<Json<Progress>> {
    owned_project(&state, &user, project_id).await?;

    let progress = Progress::find_or_create(&state.db, project_id).await?;
    Ok(Json(progress))
}
