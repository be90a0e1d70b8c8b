/// Project progress: the derived completion percentage
///
/// A project's progress row always equals
/// `100 * done_tasks / total_tasks` (0 when the project has no tasks). It is
/// never user-settable: `recompute` is invoked synchronously by every task
/// mutation before the triggering request returns, and `find_or_create`
/// covers the first read of a project that has never had a task.
///
/// The count-then-upsert pair runs under the store's default isolation;
/// concurrent task mutations on the same project are last-write-wins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Progress record, 1:1 with a project
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Progress {
    pub id: i64,

    /// Owning project (unique)
    pub project_id: i64,

    /// Derived completion percentage, 0-100
    pub completion_percentage: f64,

    pub updated_at: Option<DateTime<Utc>>,
}

/// Completion percentage for a task tally
///
/// `100 * done / total`, or 0.0 for an empty project. Pure; the sole place
/// the formula lives.
pub fn completion_percentage(done_count: i64, total_count: i64) -> f64 {
    if total_count == 0 {
        0.0
    } else {
        (done_count as f64 / total_count as f64) * 100.0
    }
}

impl Progress {
    /// Recomputes and stores a project's completion percentage
    ///
    /// Counts the project's tasks, derives the percentage, and upserts the
    /// progress row. Deleting the last task drops the percentage to 0.
    ///
    /// Must be called after every task create/update/delete that could change
    /// status counts, before the request returns.
    pub async fn recompute(pool: &PgPool, project_id: i64) -> Result<Self, sqlx::Error> {
        let (total, done): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COUNT(*) FILTER (WHERE status = 'done')
            FROM tasks
            WHERE project_id = $1
            "#,
        )
        .bind(project_id)
        .fetch_one(pool)
        .await?;

        let percentage = completion_percentage(done, total);

        sqlx::query_as::<_, Progress>(
            r#"
            INSERT INTO progress (project_id, completion_percentage, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (project_id)
            DO UPDATE SET completion_percentage = EXCLUDED.completion_percentage,
                          updated_at = NOW()
            RETURNING id, project_id, completion_percentage, updated_at
            "#,
        )
        .bind(project_id)
        .bind(percentage)
        .fetch_one(pool)
        .await
    }

    /// Fetches a project's progress, creating it at 0% on first read
    pub async fn find_or_create(pool: &PgPool, project_id: i64) -> Result<Self, sqlx::Error> {
        if let Some(progress) = sqlx::query_as::<_, Progress>(
            r#"
            SELECT id, project_id, completion_percentage, updated_at
            FROM progress
            WHERE project_id = $1
            "#,
        )
        .bind(project_id)
        .fetch_optional(pool)
        .await?
        {
            return Ok(progress);
        }

        sqlx::query_as::<_, Progress>(
            r#"
            INSERT INTO progress (project_id, completion_percentage)
            VALUES ($1, 0)
            ON CONFLICT (project_id) DO UPDATE SET project_id = EXCLUDED.project_id
            RETURNING id, project_id, completion_percentage, updated_at
            "#,
        )
        .bind(project_id)
        .fetch_one(pool)
        .await
    }

    /// Lists progress rows for all projects owned by a user
    pub async fn list_by_owner(pool: &PgPool, owner_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Progress>(
            r#"
            SELECT pr.id, pr.project_id, pr.completion_percentage, pr.updated_at
            FROM progress pr
            JOIN projects p ON p.id = pr.project_id
            WHERE p.owner_id = $1
            ORDER BY pr.project_id
            "#,
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_of_four_done_is_25_percent() {
        assert_eq!(completion_percentage(1, 4), 25.0);
    }

    #[test]
    fn test_empty_project_is_zero_not_error() {
        assert_eq!(completion_percentage(0, 0), 0.0);
    }

    #[test]
    fn test_all_done_is_100_percent() {
        assert_eq!(completion_percentage(3, 3), 100.0);
    }

    #[test]
    fn test_none_done_is_zero() {
        assert_eq!(completion_percentage(0, 7), 0.0);
    }

    #[test]
    fn test_formula_is_deterministic() {
        // Recomputing with unchanged counts yields the same value
        assert_eq!(completion_percentage(2, 3), completion_percentage(2, 3));
    }
}
