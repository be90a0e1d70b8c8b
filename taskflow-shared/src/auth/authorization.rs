/// Role and ownership checks
///
/// Two gates sit between an authenticated caller and a mutation:
///
/// - [`require_admin`]: admin-only operations. Failing this is a distinct
///   `Forbidden` — the caller is known, just under-privileged.
/// - [`check_project_access`]: owner-only resources. Failing this is
///   deliberately *not* `Forbidden`: a project that exists but belongs to
///   someone else reports exactly like a project that does not exist, so the
///   API never leaks which ids are taken. Every call site maps
///   [`ProjectAccess::NotFoundOrForbidden`] to the same not-found response.

use sqlx::PgPool;

use crate::models::{project::Project, user::User};

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Authenticated but not an admin
    #[error("Admin access required")]
    AdminRequired,
}

/// Outcome of an owner-scoped project lookup
///
/// A single tagged result used uniformly so "doesn't exist" and "exists but
/// not yours" can never diverge between endpoints.
#[derive(Debug)]
pub enum ProjectAccess {
    /// The project exists and the caller owns it
    Found(Project),

    /// No such project, or it belongs to another user; indistinguishable
    NotFoundOrForbidden,
}

/// Requires the caller to hold the admin role
///
/// # Errors
///
/// Returns `AuthzError::AdminRequired` otherwise.
pub fn require_admin(user: &User) -> Result<(), AuthzError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AuthzError::AdminRequired)
    }
}

/// Looks up a project scoped to its owner
///
/// One query filtering on both id and owner, so the two failure cases share a
/// code path as well as a response shape.
pub async fn check_project_access(
    pool: &PgPool,
    user: &User,
    project_id: i64,
) -> Result<ProjectAccess, sqlx::Error> {
    match Project::find_owned(pool, project_id, user.id).await? {
        Some(project) => Ok(ProjectAccess::Found(project)),
        None => Ok(ProjectAccess::NotFoundOrForbidden),
    }
}
