/// Integration tests for the TaskFlow API
///
/// End-to-end verification through the router:
/// - Registration and login, including the legacy plaintext credential path
/// - Uniform 401 behavior for every credential failure shape
/// - Owner-scoped project access (foreign project reads as 404)
/// - Task mutations keeping the derived completion percentage current
/// - Admin gating, admin mutations, and the audit log
///
/// Tests require a running PostgreSQL database and skip themselves when
/// DATABASE_URL is not set.

mod common;

use axum::http::StatusCode;
use common::{mint_token, unique_email, TestContext};
use serde_json::json;
use taskflow_shared::models::user::UserRole;

#[tokio::test]
async fn test_health_check() {
    let Some(mut ctx) = TestContext::new().await else { return };

    let (status, body) = ctx.request("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");

    ctx.cleanup(&[]).await;
}

#[tokio::test]
async fn test_register_and_login_roundtrip() {
    let Some(mut ctx) = TestContext::new().await else { return };

    let email = unique_email("register");
    let (status, body) = ctx
        .request(
            "POST",
            "/api/v1/users/register",
            None,
            Some(json!({
                "email": email,
                "password": "long-enough-password",
                "full_name": "New User"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], json!(email));
    assert_eq!(body["is_admin"], json!(false));
    assert!(body.get("hashed_password").is_none());
    let new_user_id = body["id"].as_i64().unwrap();

    // Duplicate email conflicts
    let (status, _) = ctx
        .request(
            "POST",
            "/api/v1/users/register",
            None,
            Some(json!({ "email": email, "password": "long-enough-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Login with the registered password and use the token
    let (status, body) = ctx
        .request(
            "POST",
            "/api/v1/users/login",
            None,
            Some(json!({ "email": email, "password": "long-enough-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");
    let token = body["access_token"].as_str().unwrap().to_string();

    let (status, body) = ctx.request("GET", "/api/v1/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], json!(email));

    ctx.cleanup(&[new_user_id]).await;
}

#[tokio::test]
async fn test_short_password_rejected_at_registration() {
    let Some(mut ctx) = TestContext::new().await else { return };

    let (status, _) = ctx
        .request(
            "POST",
            "/api/v1/users/register",
            None,
            Some(json!({ "email": unique_email("short"), "password": "short" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    ctx.cleanup(&[]).await;
}

#[tokio::test]
async fn test_legacy_plaintext_credential_still_logs_in() {
    let Some(mut ctx) = TestContext::new().await else { return };

    // The context user was stored with a plaintext credential
    let email = ctx.user.email.clone();
    let (status, body) = ctx
        .request(
            "POST",
            "/api/v1/users/login",
            None,
            Some(json!({ "email": email, "password": "test-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].is_string());

    ctx.cleanup(&[]).await;
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let Some(mut ctx) = TestContext::new().await else { return };

    let email = ctx.user.email.clone();

    // Wrong password for a real account
    let (wrong_pw, _) = ctx
        .request(
            "POST",
            "/api/v1/users/login",
            None,
            Some(json!({ "email": email, "password": "not-the-password" })),
        )
        .await;

    // Unknown account entirely
    let (unknown, _) = ctx
        .request(
            "POST",
            "/api/v1/users/login",
            None,
            Some(json!({ "email": unique_email("ghost"), "password": "whatever-pw" })),
        )
        .await;

    assert_eq!(wrong_pw, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown, StatusCode::UNAUTHORIZED);

    ctx.cleanup(&[]).await;
}

#[tokio::test]
async fn test_every_credential_failure_is_401() {
    let Some(mut ctx) = TestContext::new().await else { return };

    // No header
    let (status, _) = ctx.request("GET", "/api/v1/users/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Garbage token
    let (status, _) = ctx
        .request("GET", "/api/v1/users/me", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Valid token whose subject matches no user
    let ghost = mint_token(&unique_email("ghost"));
    let (status, _) = ctx.request("GET", "/api/v1/users/me", Some(&ghost), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    ctx.cleanup(&[]).await;
}

#[tokio::test]
async fn test_admin_email_grants_admin_at_registration() {
    let email = unique_email("founder");
    let Some(mut ctx) = TestContext::with_admin_email(Some(email.clone())).await else {
        return;
    };

    let (status, body) = ctx
        .request(
            "POST",
            "/api/v1/users/register",
            None,
            Some(json!({ "email": email, "password": "long-enough-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["is_admin"], json!(true));
    assert_eq!(body["role"], json!("admin"));
    let admin_id = body["id"].as_i64().unwrap();

    ctx.cleanup(&[admin_id]).await;
}

#[tokio::test]
async fn test_project_crud_and_ownership_scoping() {
    let Some(mut ctx) = TestContext::new().await else { return };

    let token = ctx.token.clone();
    let (status, body) = ctx
        .request(
            "POST",
            "/api/v1/projects",
            Some(&token),
            Some(json!({ "name": "My Project", "description": "d" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let project_id = body["id"].as_i64().unwrap();

    // Owner reads it back
    let (status, body) = ctx
        .request("GET", &format!("/api/v1/projects/{}", project_id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "My Project");

    // Another user sees 404, not 403
    let other = ctx.create_user("other", "password-123", UserRole::User).await;
    let other_token = mint_token(&other.email);
    let (status, _) = ctx
        .request("GET", &format!("/api/v1/projects/{}", project_id), Some(&other_token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Same for update and delete
    let (status, _) = ctx
        .request(
            "PUT",
            &format!("/api/v1/projects/{}", project_id),
            Some(&other_token),
            Some(json!({ "name": "hijacked" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Owner deletes
    let (status, _) = ctx
        .request("DELETE", &format!("/api/v1/projects/{}", project_id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = ctx
        .request("GET", &format!("/api/v1/projects/{}", project_id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    ctx.cleanup(&[other.id]).await;
}

#[tokio::test]
async fn test_task_mutations_keep_progress_current() {
    let Some(mut ctx) = TestContext::new().await else { return };

    let token = ctx.token.clone();
    let (_, body) = ctx
        .request(
            "POST",
            "/api/v1/projects",
            Some(&token),
            Some(json!({ "name": "Progress Project" })),
        )
        .await;
    let project_id = body["id"].as_i64().unwrap();

    // First read of an empty project materializes 0%
    let (status, body) = ctx
        .request(
            "GET",
            &format!("/api/v1/progress/project/{}", project_id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["completion_percentage"], json!(0.0));

    // Four tasks, one done: 25%
    let mut task_ids = Vec::new();
    for (i, status_str) in ["done", "todo", "todo", "in_progress"].iter().enumerate() {
        let (status, body) = ctx
            .request(
                "POST",
                "/api/v1/tasks",
                Some(&token),
                Some(json!({
                    "title": format!("task {}", i),
                    "status": status_str,
                    "project_id": project_id
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        task_ids.push(body["id"].as_i64().unwrap());
    }

    let (_, body) = ctx
        .request(
            "GET",
            &format!("/api/v1/progress/project/{}", project_id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(body["completion_percentage"], json!(25.0));

    // Completing a second task: 50%, visible immediately after the write
    let (status, _) = ctx
        .request(
            "PUT",
            &format!("/api/v1/tasks/{}", task_ids[1]),
            Some(&token),
            Some(json!({ "status": "done" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = ctx
        .request(
            "GET",
            &format!("/api/v1/progress/project/{}", project_id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(body["completion_percentage"], json!(50.0));

    // Deleting every task drops it back to 0
    for id in &task_ids {
        let (status, _) = ctx
            .request("DELETE", &format!("/api/v1/tasks/{}", id), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
    let (_, body) = ctx
        .request(
            "GET",
            &format!("/api/v1/progress/project/{}", project_id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(body["completion_percentage"], json!(0.0));

    ctx.cleanup(&[]).await;
}

#[tokio::test]
async fn test_task_in_foreign_project_reads_as_not_found() {
    let Some(mut ctx) = TestContext::new().await else { return };

    let token = ctx.token.clone();
    let (_, body) = ctx
        .request("POST", "/api/v1/projects", Some(&token), Some(json!({ "name": "P" })))
        .await;
    let project_id = body["id"].as_i64().unwrap();
    let (_, body) = ctx
        .request(
            "POST",
            "/api/v1/tasks",
            Some(&token),
            Some(json!({ "title": "t", "project_id": project_id })),
        )
        .await;
    let task_id = body["id"].as_i64().unwrap();

    let other = ctx.create_user("other", "password-123", UserRole::User).await;
    let other_token = mint_token(&other.email);

    let (status, _) = ctx
        .request("GET", &format!("/api/v1/tasks/{}", task_id), Some(&other_token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Creating a task in someone else's project fails the same way
    let (status, _) = ctx
        .request(
            "POST",
            "/api/v1/tasks",
            Some(&other_token),
            Some(json!({ "title": "sneaky", "project_id": project_id })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    ctx.cleanup(&[other.id]).await;
}

#[tokio::test]
async fn test_admin_routes_reject_regular_users() {
    let Some(mut ctx) = TestContext::new().await else { return };

    let token = ctx.token.clone();
    for uri in ["/api/v1/admin/stats", "/api/v1/admin/users", "/api/v1/admin/logs"] {
        let (status, _) = ctx.request("GET", uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{} should be admin-only", uri);
    }

    // Admin-gated user listing and CSV export too
    let (status, _) = ctx.request("GET", "/api/v1/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = ctx.request("GET", "/api/v1/users/export", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    ctx.cleanup(&[]).await;
}

#[tokio::test]
async fn test_admin_mutations_append_audit_records() {
    let Some(mut ctx) = TestContext::new().await else { return };

    let admin = ctx.create_user("admin", "admin-password", UserRole::Admin).await;
    let admin_token = mint_token(&admin.email);
    let target_id = ctx.user.id;

    // Suspend the context user
    let (status, body) = ctx
        .request(
            "PATCH",
            &format!("/api/v1/admin/users/{}/suspend", target_id),
            Some(&admin_token),
            Some(json!({ "is_suspended": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_suspended"], json!(true));

    // Promote them
    let (status, body) = ctx
        .request(
            "PATCH",
            &format!("/api/v1/admin/users/{}/admin", target_id),
            Some(&admin_token),
            Some(json!({ "is_admin": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_admin"], json!(true));
    assert_eq!(body["role"], json!("admin"));

    // Delete them (another user, so this succeeds)
    let (status, _) = ctx
        .request(
            "DELETE",
            &format!("/api/v1/admin/users/{}", target_id),
            Some(&admin_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // All three actions are in the log, exactly once each
    let (status, body) = ctx
        .request("GET", "/api/v1/admin/logs", Some(&admin_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let items = body["items"].as_array().unwrap();
    let actions: Vec<&str> = items
        .iter()
        .filter(|l| l["target_id"].as_i64() == Some(target_id))
        .filter_map(|l| l["action"].as_str())
        .collect();
    assert!(actions.contains(&"suspend_toggle"));
    assert!(actions.contains(&"admin_toggle"));
    assert_eq!(actions.iter().filter(|a| **a == "user_deleted").count(), 1);

    ctx.cleanup(&[admin.id]).await;
}

#[tokio::test]
async fn test_admin_cannot_delete_self() {
    let Some(mut ctx) = TestContext::new().await else { return };

    let admin = ctx.create_user("admin", "admin-password", UserRole::Admin).await;
    let admin_token = mint_token(&admin.email);

    let (status, _) = ctx
        .request(
            "DELETE",
            &format!("/api/v1/admin/users/{}", admin.id),
            Some(&admin_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    ctx.cleanup(&[admin.id]).await;
}

#[tokio::test]
async fn test_admin_reset_password_switches_to_hashed() {
    let Some(mut ctx) = TestContext::new().await else { return };

    let admin = ctx.create_user("admin", "admin-password", UserRole::Admin).await;
    let admin_token = mint_token(&admin.email);
    let target = ctx.user.id;
    let email = ctx.user.email.clone();

    let (status, _) = ctx
        .request(
            "POST",
            &format!("/api/v1/admin/users/{}/reset-password", target),
            Some(&admin_token),
            Some(json!({ "new_password": "brand-new-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Old (plaintext) credential no longer works; the new one does
    let (status, _) = ctx
        .request(
            "POST",
            "/api/v1/users/login",
            None,
            Some(json!({ "email": email, "password": "test-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = ctx
        .request(
            "POST",
            "/api/v1/users/login",
            None,
            Some(json!({ "email": email, "password": "brand-new-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    ctx.cleanup(&[admin.id]).await;
}

#[tokio::test]
async fn test_csv_export_has_expected_header() {
    let Some(mut ctx) = TestContext::new().await else { return };

    let admin = ctx.create_user("admin", "admin-password", UserRole::Admin).await;
    let admin_token = mint_token(&admin.email);

    let (status, body) = ctx
        .request_raw("GET", "/api/v1/users/export", Some(&admin_token))
        .await;
    assert_eq!(status, StatusCode::OK);
    let first_line = body.lines().next().unwrap();
    assert_eq!(first_line, "id,email,full_name,is_admin,created_at");
    assert!(body.lines().any(|l| l.contains(&admin.email)));

    ctx.cleanup(&[admin.id]).await;
}

#[tokio::test]
async fn test_admin_task_delete_recomputes_progress() {
    let Some(mut ctx) = TestContext::new().await else { return };

    let token = ctx.token.clone();
    let (_, body) = ctx
        .request("POST", "/api/v1/projects", Some(&token), Some(json!({ "name": "P" })))
        .await;
    let project_id = body["id"].as_i64().unwrap();
    let (_, body) = ctx
        .request(
            "POST",
            "/api/v1/tasks",
            Some(&token),
            Some(json!({ "title": "t", "status": "done", "project_id": project_id })),
        )
        .await;
    let task_id = body["id"].as_i64().unwrap();

    let (_, body) = ctx
        .request(
            "GET",
            &format!("/api/v1/progress/project/{}", project_id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(body["completion_percentage"], json!(100.0));

    let admin = ctx.create_user("admin", "admin-password", UserRole::Admin).await;
    let admin_token = mint_token(&admin.email);
    let (status, _) = ctx
        .request(
            "DELETE",
            &format!("/api/v1/admin/tasks/{}", task_id),
            Some(&admin_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = ctx
        .request(
            "GET",
            &format!("/api/v1/progress/project/{}", project_id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(body["completion_percentage"], json!(0.0));

    ctx.cleanup(&[admin.id]).await;
}
