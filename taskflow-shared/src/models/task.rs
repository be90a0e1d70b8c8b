/// Task model and database operations
///
/// Tasks belong to exactly one project. Ownership is enforced per-request at
/// the handler level, not here: every route resolves the task's project
/// through the caller before mutating. Mutations that can change status
/// counts are followed synchronously by `Progress::recompute` so callers
/// never observe a stale completion percentage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Task completion state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Todo
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

/// Task model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task id
    pub id: i64,

    /// Task title
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Completion state
    pub status: TaskStatus,

    /// Optional due date
    pub due_date: Option<DateTime<Utc>>,

    /// Optional day the task is scheduled for
    pub scheduled_day: Option<DateTime<Utc>>,

    /// Priority, defaults to medium
    pub priority: TaskPriority,

    /// Owning project
    pub project_id: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Input for creating a task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub due_date: Option<DateTime<Utc>>,
    pub scheduled_day: Option<DateTime<Utc>>,
    pub priority: TaskPriority,
    pub project_id: i64,
}

/// Input for updating a task; only `Some` fields are written
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<DateTime<Utc>>,
    pub scheduled_day: Option<DateTime<Utc>>,
    pub priority: Option<TaskPriority>,
}

/// A page of tasks plus the unpaged total
#[derive(Debug, Clone)]
pub struct TaskPage {
    pub items: Vec<Task>,
    pub total: i64,
}

impl Task {
    /// Creates a task in a project
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (title, description, status, due_date, scheduled_day, priority, project_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, title, description, status, due_date, scheduled_day, priority,
                      project_id, created_at, updated_at
            "#,
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .bind(data.due_date)
        .bind(data.scheduled_day)
        .bind(data.priority)
        .bind(data.project_id)
        .fetch_one(pool)
        .await
    }

    /// Finds a task by id
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, due_date, scheduled_day, priority,
                   project_id, created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Lists all tasks in a project
    pub async fn list_by_project(pool: &PgPool, project_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, due_date, scheduled_day, priority,
                   project_id, created_at, updated_at
            FROM tasks
            WHERE project_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    /// Updates a task; only `Some` fields are written, `updated_at` is bumped
    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                status = COALESCE($4, status),
                due_date = COALESCE($5, due_date),
                scheduled_day = COALESCE($6, scheduled_day),
                priority = COALESCE($7, priority),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, status, due_date, scheduled_day, priority,
                      project_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .bind(data.due_date)
        .bind(data.scheduled_day)
        .bind(data.priority)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a task
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists all tasks across projects, newest first (admin listing)
    pub async fn list_paged(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<TaskPage, sqlx::Error> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks")
            .fetch_one(pool)
            .await?;

        let items = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, due_date, scheduled_day, priority,
                   project_id, created_at, updated_at
            FROM tasks
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(TaskPage { items, total })
    }

    /// Counts total number of tasks
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// Counts tasks marked done today (UTC), for the admin dashboard
    pub async fn count_completed_today(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM tasks
            WHERE status = 'done' AND updated_at::date = NOW()::date
            "#,
        )
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Counts tasks due today (UTC), for the admin dashboard
    pub async fn count_due_today(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM tasks
            WHERE due_date::date = NOW()::date
            "#,
        )
        .fetch_one(pool)
        .await?;

        Ok(count)
    }
}
