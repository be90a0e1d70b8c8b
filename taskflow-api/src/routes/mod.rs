/// API route handlers
///
/// Handlers are organized by resource:
///
/// - `health`: Health check endpoint
/// - `users`: Registration, login, profile, admin user management
/// - `projects`: Owner-scoped project CRUD
/// - `tasks`: Task CRUD with synchronous progress recomputation
/// - `progress`: Derived completion percentage reads
/// - `admin`: Dashboard stats, cross-user management, audit logs

pub mod admin;
pub mod health;
pub mod progress;
pub mod projects;
pub mod tasks;
pub mod users;
