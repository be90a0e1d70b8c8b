/// Database models for TaskFlow
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts, roles, and authentication data
/// - `project`: Projects owned by users
/// - `task`: Tasks within a project
/// - `progress`: Derived per-project completion percentage
/// - `admin_log`: Append-only audit log of admin actions
///
/// # Example
///
/// ```no_run
/// use taskflow_shared::models::user::{CreateUser, User, UserRole};
/// use taskflow_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let new_user = CreateUser {
///     email: "user@example.com".to_string(),
///     hashed_password: "$2b$12$...".to_string(),
///     full_name: Some("Jane Doe".to_string()),
///     role: UserRole::User,
/// };
///
/// let user = User::create(&pool, new_user).await?;
/// # Ok(())
/// # }
/// ```

pub mod admin_log;
pub mod progress;
pub mod project;
pub mod task;
pub mod user;
