/// Application state and router builder
///
/// Defines the shared application state and the function that assembles the
/// Axum router tree with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use taskflow_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = taskflow_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, patch, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskflow_shared::auth::middleware::{resolve_caller, CurrentUser};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor. The config
/// sits behind an Arc and is immutable after startup.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                            # Health check (public)
/// └── /api/v1/
///     ├── /users/
///     │   ├── POST /register             # public
///     │   ├── POST /login                # public
///     │   ├── GET|PUT /me
///     │   ├── GET /                      # admin: search + pagination
///     │   ├── GET /export                # admin: CSV
///     │   └── PUT|DELETE /:id            # admin
///     ├── /projects/                     # owner-scoped CRUD
///     ├── /tasks/                        # owner-scoped, progress recomputed
///     ├── /progress/                     # derived completion reads
///     └── /admin/                        # stats, management, audit logs
/// ```
///
/// Everything except health and register/login sits behind the
/// authentication layer, which resolves the caller and injects
/// [`CurrentUser`]. Admin-only handlers additionally call `require_admin`.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Public user routes
    let public_user_routes = Router::new()
        .route("/register", post(routes::users::register))
        .route("/login", post(routes::users::login));

    // Authenticated user routes
    let user_routes = Router::new()
        .route("/me", get(routes::users::get_me).put(routes::users::update_me))
        .route("/", get(routes::users::list_users))
        .route("/export", get(routes::users::export_users_csv))
        .route("/:id", put(routes::users::update_user).delete(routes::users::delete_user));

    let project_routes = Router::new()
        .route(
            "/",
            post(routes::projects::create_project).get(routes::projects::list_projects),
        )
        .route(
            "/:id",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        );

    let task_routes = Router::new()
        .route("/", post(routes::tasks::create_task))
        .route("/project/:project_id", get(routes::tasks::list_project_tasks))
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        );

    let progress_routes = Router::new()
        .route("/", get(routes::progress::list_progress))
        .route("/project/:project_id", get(routes::progress::get_project_progress));

    let admin_routes = Router::new()
        .route("/stats", get(routes::admin::get_stats))
        .route("/users", get(routes::admin::list_users))
        .route("/users/:id/admin", patch(routes::admin::toggle_admin))
        .route("/users/:id/suspend", patch(routes::admin::toggle_suspend))
        .route("/users/:id/reset-password", post(routes::admin::reset_password))
        .route("/users/:id", delete(routes::admin::delete_user))
        .route("/projects", get(routes::admin::list_projects))
        .route("/projects/:id", delete(routes::admin::delete_project))
        .route("/projects/:id/tasks", get(routes::admin::list_project_tasks))
        .route("/tasks", get(routes::admin::list_tasks))
        .route("/tasks/:id", delete(routes::admin::delete_task))
        .route("/logs", get(routes::admin::list_logs));

    // Everything behind the auth layer
    let protected = Router::new()
        .nest("/users", user_routes)
        .nest("/projects", project_routes)
        .nest("/tasks", task_routes)
        .nest("/progress", progress_routes)
        .nest("/admin", admin_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_layer,
        ));

    let v1_routes = Router::new()
        .nest("/users", public_user_routes)
        .merge(protected);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/api/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Authentication middleware layer
///
/// Resolves the calling user from the Authorization header and injects
/// [`CurrentUser`] into request extensions. Every credential failure is the
/// same 401.
async fn auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let user = resolve_caller(&state.db, state.jwt_secret(), req.headers()).await?;

    req.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(req).await)
}
