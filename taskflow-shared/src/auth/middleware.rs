/// Request authentication: resolving the calling user
///
/// Extracts the `Authorization: Bearer <token>` header, validates the token,
/// and looks the subject email up in the users table. All failure shapes —
/// missing header, malformed header, bad or expired token, token whose
/// subject matches no user — collapse to one `Unauthenticated` error so a
/// caller probing the API cannot tell them apart.
///
/// On success the resolved [`CurrentUser`] is inserted into request
/// extensions for handlers to extract.
///
/// # Example
///
/// ```no_run
/// use axum::Extension;
/// use taskflow_shared::auth::middleware::CurrentUser;
///
/// async fn handler(Extension(CurrentUser(user)): Extension<CurrentUser>) -> String {
///     format!("Hello, {}!", user.email)
/// }
/// ```

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use sqlx::PgPool;

use super::jwt::validate_token;
use crate::models::user::User;

/// The authenticated user, injected into request extensions
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Error type for request authentication
#[derive(Debug)]
pub enum AuthError {
    /// Missing, malformed, or invalid credentials; also covers a valid token
    /// whose subject has no matching user
    Unauthenticated,

    /// Database error during user lookup
    DatabaseError(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::Unauthenticated => {
                (StatusCode::UNAUTHORIZED, "Could not validate credentials").into_response()
            }
            AuthError::DatabaseError(msg) => {
                tracing::error!("Auth lookup failed: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

/// Resolves the calling user from request headers
///
/// # Errors
///
/// Returns `AuthError::Unauthenticated` for every credential problem and
/// `AuthError::DatabaseError` only when the user lookup itself fails.
pub async fn resolve_caller(
    pool: &PgPool,
    secret: &str,
    headers: &HeaderMap,
) -> Result<User, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::Unauthenticated)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::Unauthenticated)?;

    let claims = validate_token(token, secret).map_err(|_| AuthError::Unauthenticated)?;

    // A subject with no matching user fails identically to a bad token
    User::find_by_email(pool, &claims.sub)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?
        .ok_or(AuthError::Unauthenticated)
}
