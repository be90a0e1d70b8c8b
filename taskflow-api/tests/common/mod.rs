/// Common test utilities for integration tests
///
/// Shared infrastructure: database setup, test user creation, token minting,
/// and a request helper that drives the router directly without binding a
/// socket. Tests require a running PostgreSQL database and skip themselves
/// when DATABASE_URL is not set.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use std::sync::atomic::{AtomicU64, Ordering};
use taskflow_api::app::{build_router, AppState};
use taskflow_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig};
use taskflow_shared::auth::jwt::{create_token, Claims};
use taskflow_shared::auth::password::hash_password;
use taskflow_shared::models::user::{CreateUser, User, UserRole};
use tower::Service as _;

/// Secret used by every test token; long enough for the startup check
pub const TEST_JWT_SECRET: &str = "integration-test-secret-key-0123456789abcdef";

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique email per test so runs never collide on the unique constraint
pub fn unique_email(tag: &str) -> String {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}-{}-{}@example.com", tag, std::process::id(), n)
}

/// Test context containing the router, pool, and a ready-made user
pub struct TestContext {
    pub db: sqlx::PgPool,
    pub app: Router,
    pub config: Config,
    pub user: User,
    pub token: String,
}

impl TestContext {
    /// Creates a test context, or None when DATABASE_URL is not set
    pub async fn new() -> Option<Self> {
        Self::with_admin_email(None).await
    }

    /// Same, with an ADMIN_EMAIL configured for registration tests
    pub async fn with_admin_email(admin_email: Option<String>) -> Option<Self> {
        let url = std::env::var("DATABASE_URL").ok()?;

        let db = sqlx::PgPool::connect(&url).await.expect("Failed to connect");

        // Path is relative to this crate's Cargo.toml
        sqlx::migrate!("../taskflow-shared/migrations")
            .run(&db)
            .await
            .expect("Migrations should apply");

        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
            },
            database: DatabaseConfig {
                url,
                max_connections: 5,
            },
            jwt: JwtConfig {
                secret: TEST_JWT_SECRET.to_string(),
                access_token_expire_minutes: 30,
            },
            admin_email,
        };

        // Stored as a legacy plaintext credential; login tests that need the
        // hashed path create their own users.
        let user = User::create(
            &db,
            CreateUser {
                email: unique_email("ctx"),
                hashed_password: "test-password".to_string(),
                full_name: Some("Test User".to_string()),
                role: UserRole::User,
            },
        )
        .await
        .expect("User creation should succeed");

        let token = mint_token(&user.email);

        let state = AppState::new(db.clone(), config.clone());
        let app = build_router(state);

        Some(TestContext {
            db,
            app,
            config,
            user,
            token,
        })
    }

    /// Creates an additional user with a bcrypt-hashed password
    pub async fn create_user(&self, tag: &str, password: &str, role: UserRole) -> User {
        User::create(
            &self.db,
            CreateUser {
                email: unique_email(tag),
                hashed_password: hash_password(password).expect("Hashing should succeed"),
                full_name: None,
                role,
            },
        )
        .await
        .expect("User creation should succeed")
    }

    /// Sends a request through the router and parses the JSON response
    pub async fn request(
        &mut self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.call(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };

        (status, json)
    }

    /// Sends a request and returns the raw body, for non-JSON responses
    pub async fn request_raw(
        &mut self,
        method: &str,
        uri: &str,
        token: Option<&str>,
    ) -> (StatusCode, String) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", format!("Bearer {}", token.unwrap_or(&self.token)))
            .body(Body::empty())
            .unwrap();

        let response = self.app.call(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        (status, String::from_utf8_lossy(&bytes).to_string())
    }

    /// Deletes users created during the test; cascades clean up the rest
    pub async fn cleanup(&self, extra_user_ids: &[i64]) {
        User::delete(&self.db, self.user.id).await.ok();
        for id in extra_user_ids {
            User::delete(&self.db, *id).await.ok();
        }
    }
}

/// Mints a valid token for an email with the test secret
pub fn mint_token(email: &str) -> String {
    let claims = Claims::new(email, None);
    create_token(&claims, TEST_JWT_SECRET).expect("Token creation should succeed")
}
