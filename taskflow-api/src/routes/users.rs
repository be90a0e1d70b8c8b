/// User endpoints: registration, login, profile, and admin user management
///
/// # Endpoints
///
/// - `POST /api/v1/users/register` - Register a new user (public)
/// - `POST /api/v1/users/login` - Login and get an access token (public)
/// - `GET /api/v1/users/me` - Current user profile
/// - `PUT /api/v1/users/me` - Update current user profile
/// - `GET /api/v1/users` - List users with search + pagination (admin)
/// - `GET /api/v1/users/export` - Export users as CSV (admin)
/// - `PUT /api/v1/users/:id` - Update a user (admin)
/// - `DELETE /api/v1/users/:id` - Delete a user (admin)

use crate::{
    app::AppState,
    error::{validation_error, ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use taskflow_shared::{
    auth::{authorization::require_admin, jwt, middleware::CurrentUser, password},
    models::user::{CreateUser, UpdateUser, User, UserRole},
};
use validator::Validate;

/// User as exposed by the API
///
/// `is_admin` is derived from `role`; the hashed password never leaves the
/// server.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub full_name: Option<String>,
    pub is_admin: bool,
    pub role: UserRole,
    pub is_suspended: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        let is_admin = user.is_admin();
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            is_admin,
            role: user.role,
            is_suspended: user.is_suspended,
            created_at: user.created_at,
        }
    }
}

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,

    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub full_name: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

/// Profile/admin update request
///
/// `is_admin` and `role` are alternative spellings of the same privilege
/// change; both map onto the single stored role.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UserUpdateRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub full_name: Option<String>,

    pub password: Option<String>,

    pub is_admin: Option<bool>,

    pub role: Option<String>,
}

/// Search + pagination query for the admin listing
#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub q: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Paged users response
#[derive(Debug, Serialize)]
pub struct UsersListResponse {
    pub items: Vec<UserResponse>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

/// Clamps pagination inputs: page >= 1, per_page in [1, 200]
pub(crate) fn clamp_page(page: Option<i64>, per_page: Option<i64>, default_per_page: i64) -> (i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page.unwrap_or(default_per_page).clamp(1, 200);
    (page, per_page)
}

/// Register a new user
///
/// Duplicate emails conflict. When the configured `ADMIN_EMAIL` matches the
/// registering address, the account is created with the admin role.
///
/// # Errors
///
/// - `409 Conflict`: email already registered
/// - `422 Unprocessable Entity`: validation failed
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    req.validate().map_err(validation_error)?;

    password::validate_password_strength(&req.password).map_err(|e| {
        validation_error_for_field("password", e)
    })?;

    if User::find_by_email(&state.db, &req.email).await?.is_some() {
        return Err(ApiError::Conflict("Email already registered".to_string()));
    }

    let role = match &state.config.admin_email {
        Some(admin_email) if admin_email.eq_ignore_ascii_case(&req.email) => UserRole::Admin,
        _ => UserRole::User,
    };

    let hashed_password = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            email: req.email,
            hashed_password,
            full_name: req.full_name,
            role,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Login and mint an access token
///
/// Unknown email and wrong password produce the same 401; login never leaks
/// which one failed. Credential verification cannot error out — internal
/// faults count as a failed check.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    req.validate().map_err(validation_error)?;

    let user = User::find_by_email(&state.db, &req.email).await?;

    let authenticated = match user {
        Some(user) if password::verify_password(&req.password, &user.hashed_password) => user,
        _ => {
            return Err(ApiError::Unauthorized(
                "Incorrect email or password".to_string(),
            ))
        }
    };

    let ttl = Duration::minutes(state.config.jwt.access_token_expire_minutes);
    let claims = jwt::Claims::new(&authenticated.email, Some(ttl));
    let access_token = jwt::create_token(&claims, state.jwt_secret())?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

/// Current user profile
pub async fn get_me(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<UserResponse>> {
    Ok(Json(user.into()))
}

/// Update the current user's profile
///
/// Email, display name, and password only; privilege changes go through the
/// admin endpoints.
pub async fn update_me(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<UserUpdateRequest>,
) -> ApiResult<Json<UserResponse>> {
    req.validate().map_err(validation_error)?;

    if let Some(ref email) = req.email {
        if *email != user.email && User::find_by_email(&state.db, email).await?.is_some() {
            return Err(ApiError::Conflict("Email already registered".to_string()));
        }
    }

    let hashed_password = match req.password {
        Some(ref p) => {
            password::validate_password_strength(p)
                .map_err(|e| validation_error_for_field("password", e))?;
            Some(password::hash_password(p)?)
        }
        None => None,
    };

    let updated = User::update(
        &state.db,
        user.id,
        UpdateUser {
            email: req.email,
            hashed_password,
            full_name: req.full_name,
            role: None,
            is_suspended: None,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(updated.into()))
}

/// List users with optional search and pagination (admin only)
pub async fn list_users(
    State(state): State<AppState>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Query(query): Query<ListUsersQuery>,
) -> ApiResult<Json<UsersListResponse>> {
    require_admin(&caller)?;

    let (page, per_page) = clamp_page(query.page, query.per_page, 20);
    let result = User::search(
        &state.db,
        query.q.as_deref(),
        per_page,
        (page - 1) * per_page,
    )
    .await?;

    Ok(Json(UsersListResponse {
        items: result.items.into_iter().map(Into::into).collect(),
        total: result.total,
        page,
        per_page,
    }))
}

/// Export all users as CSV (admin only)
///
/// Columns: `id,email,full_name,is_admin,created_at`. The admin flag is
/// rendered as 0/1.
pub async fn export_users_csv(
    State(state): State<AppState>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
) -> ApiResult<Response> {
    require_admin(&caller)?;

    let users = User::list_all(&state.db).await?;

    let mut lines = vec!["id,email,full_name,is_admin,created_at".to_string()];
    for u in &users {
        lines.push(format!(
            "{},{},{},{},{}",
            u.id,
            u.email,
            u.full_name.as_deref().unwrap_or(""),
            u.is_admin() as u8,
            u.created_at.to_rfc3339(),
        ));
    }
    let csv = lines.join("\n");

    Ok(([(header::CONTENT_TYPE, "text/csv")], csv).into_response())
}

/// Update any user (admin only)
///
/// A privilege change may arrive as `is_admin` or as `role`; when both are
/// present `role` wins, matching the original API's field precedence. Unknown
/// role strings are rejected.
pub async fn update_user(
    State(state): State<AppState>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(user_id): Path<i64>,
    Json(req): Json<UserUpdateRequest>,
) -> ApiResult<Json<UserResponse>> {
    require_admin(&caller)?;
    req.validate().map_err(validation_error)?;

    let role = match (&req.role, req.is_admin) {
        (Some(role_str), _) => Some(
            UserRole::parse(role_str)
                .ok_or_else(|| ApiError::BadRequest(format!("Unknown role: {}", role_str)))?,
        ),
        (None, Some(is_admin)) => Some(UserRole::from_is_admin(is_admin)),
        (None, None) => None,
    };

    let hashed_password = match req.password {
        Some(ref p) => Some(password::hash_password(p)?),
        None => None,
    };

    let updated = User::update(
        &state.db,
        user_id,
        UpdateUser {
            email: req.email,
            hashed_password,
            full_name: req.full_name,
            role,
            is_suspended: None,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(updated.into()))
}

/// Delete a user (admin only)
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(user_id): Path<i64>,
) -> ApiResult<StatusCode> {
    require_admin(&caller)?;

    if !User::delete(&state.db, user_id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

fn validation_error_for_field(field: &str, message: String) -> ApiError {
    ApiError::ValidationError(vec![crate::error::ValidationErrorDetail {
        field: field.to_string(),
        message,
    }])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_page_defaults() {
        assert_eq!(clamp_page(None, None, 20), (1, 20));
    }

    #[test]
    fn test_clamp_page_bounds() {
        assert_eq!(clamp_page(Some(0), Some(0), 20), (1, 1));
        assert_eq!(clamp_page(Some(-5), Some(1000), 20), (1, 200));
        assert_eq!(clamp_page(Some(3), Some(50), 20), (3, 50));
    }

    #[test]
    fn test_user_response_hides_password_hash() {
        let json = serde_json::to_value(UserResponse {
            id: 1,
            email: "a@example.com".to_string(),
            full_name: None,
            is_admin: true,
            role: UserRole::Admin,
            is_suspended: false,
            created_at: Utc::now(),
        })
        .unwrap();

        assert!(json.get("hashed_password").is_none());
        assert_eq!(json["is_admin"], serde_json::json!(true));
        assert_eq!(json["role"], serde_json::json!("admin"));
    }
}
