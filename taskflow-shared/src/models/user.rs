/// User model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id BIGSERIAL PRIMARY KEY,
///     email TEXT NOT NULL UNIQUE,
///     hashed_password TEXT NOT NULL,
///     full_name TEXT,
///     role TEXT NOT NULL DEFAULT 'user',
///     is_suspended BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Privilege is stored as a single `role` column. The `is_admin` flag that
/// API consumers see is derived from it, so the two can never disagree.
///
/// `hashed_password` normally holds a bcrypt hash but may still hold a legacy
/// plaintext secret; see `auth::password` for the dual-path verification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Privilege level of a user account
///
/// The single source of truth for authorization decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    /// Gets role as its stored string form
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }

    /// Parses a role string, rejecting unknown values
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(UserRole::User),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }

    /// Derives a role from the boolean admin flag used by API clients
    pub fn from_is_admin(is_admin: bool) -> Self {
        if is_admin {
            UserRole::Admin
        } else {
            UserRole::User
        }
    }
}

/// User model representing an account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user id
    pub id: i64,

    /// Email address, unique across all users
    pub email: String,

    /// bcrypt hash, or a legacy plaintext secret awaiting migration
    pub hashed_password: String,

    /// Optional display name
    pub full_name: Option<String>,

    /// Privilege level
    pub role: UserRole,

    /// Whether the account is suspended
    pub is_suspended: bool,

    /// When the account was created
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Whether this user holds the admin role
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub hashed_password: String,
    pub full_name: Option<String>,
    pub role: UserRole,
}

/// Input for updating an existing user
///
/// All fields are optional; only `Some` fields are written.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub hashed_password: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<UserRole>,
    pub is_suspended: Option<bool>,
}

/// A page of users plus the unpaged total, for admin listings
#[derive(Debug, Clone)]
pub struct UserPage {
    pub items: Vec<User>,
    pub total: i64,
}

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Returns an error if the email already exists (unique constraint) or
    /// the database is unreachable.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, hashed_password, full_name, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, hashed_password, full_name, role, is_suspended, created_at
            "#,
        )
        .bind(data.email)
        .bind(data.hashed_password)
        .bind(data.full_name)
        .bind(data.role)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by id
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, hashed_password, full_name, role, is_suspended, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a user by email address
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, hashed_password, full_name, role, is_suspended, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    /// Updates an existing user
    ///
    /// Only `Some` fields in `data` are written.
    ///
    /// # Returns
    ///
    /// The updated user if found, None if no such user exists
    ///
    /// # Errors
    ///
    /// Returns an error if the new email already belongs to another user or
    /// the database is unreachable.
    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET email = COALESCE($2, email),
                hashed_password = COALESCE($3, hashed_password),
                full_name = COALESCE($4, full_name),
                role = COALESCE($5, role),
                is_suspended = COALESCE($6, is_suspended)
            WHERE id = $1
            RETURNING id, email, hashed_password, full_name, role, is_suspended, created_at
            "#,
        )
        .bind(id)
        .bind(data.email)
        .bind(data.hashed_password)
        .bind(data.full_name)
        .bind(data.role)
        .bind(data.is_suspended)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Deletes a user by id
    ///
    /// Cascades to the user's projects (and through them, tasks and progress).
    ///
    /// # Returns
    ///
    /// True if a user was deleted, false if none existed
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists users with optional search over email and display name
    ///
    /// Returns the requested page (newest first) plus the total count matching
    /// the search, for pagination metadata.
    pub async fn search(
        pool: &PgPool,
        query: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<UserPage, sqlx::Error> {
        let like = query.map(|q| format!("%{}%", q));

        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM users
            WHERE $1::text IS NULL OR email ILIKE $1 OR full_name ILIKE $1
            "#,
        )
        .bind(like.as_deref())
        .fetch_one(pool)
        .await?;

        let items = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, hashed_password, full_name, role, is_suspended, created_at
            FROM users
            WHERE $1::text IS NULL OR email ILIKE $1 OR full_name ILIKE $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(like.as_deref())
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(UserPage { items, total })
    }

    /// Lists every user ordered by id, for the CSV export
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, hashed_password, full_name, role, is_suspended, created_at
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Lists the most recently created users
    pub async fn list_recent(pool: &PgPool, limit: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, hashed_password, full_name, role, is_suspended, created_at
            FROM users
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Counts total number of users
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}
