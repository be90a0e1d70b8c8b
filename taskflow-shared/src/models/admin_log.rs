/// Admin audit log: append-only records of admin mutations
///
/// Every admin mutation (toggle admin, suspend, password reset, deletes)
/// appends exactly one row. Entries are never updated or deleted. The
/// `details` column is an opaque serialized blob of key/value pairs
/// describing the action; it is stored and returned verbatim.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// One audit record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AdminLog {
    pub id: i64,

    /// Acting admin
    pub admin_id: i64,

    /// Action tag, e.g. "user_deleted", "admin_toggle"
    pub action: String,

    /// Kind of entity acted on: "user", "project", "task"
    pub target_type: String,

    /// Id of the entity acted on
    pub target_id: i64,

    /// Opaque JSON details, e.g. `{"is_admin": true}`
    pub details: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// A page of log entries plus the unpaged total
#[derive(Debug, Clone)]
pub struct AdminLogPage {
    pub items: Vec<AdminLog>,
    pub total: i64,
}

impl AdminLog {
    /// Appends an audit record
    ///
    /// `details`, when present, is serialized to its JSON text form and stored
    /// as-is.
    pub async fn record(
        pool: &PgPool,
        admin_id: i64,
        action: &str,
        target_type: &str,
        target_id: i64,
        details: Option<serde_json::Value>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, AdminLog>(
            r#"
            INSERT INTO admin_logs (admin_id, action, target_type, target_id, details)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, admin_id, action, target_type, target_id, details, created_at
            "#,
        )
        .bind(admin_id)
        .bind(action)
        .bind(target_type)
        .bind(target_id)
        .bind(details.map(|d| d.to_string()))
        .fetch_one(pool)
        .await
    }

    /// Lists audit records, newest first
    pub async fn list_paged(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<AdminLogPage, sqlx::Error> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM admin_logs")
            .fetch_one(pool)
            .await?;

        let items = sqlx::query_as::<_, AdminLog>(
            r#"
            SELECT id, admin_id, action, target_type, target_id, details, created_at
            FROM admin_logs
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(AdminLogPage { items, total })
    }
}
