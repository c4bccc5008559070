/// End-to-end tests for the ResumeFlow API
///
/// Requests go through the full router (guards, handlers, error mapping)
/// against the database named by `DATABASE_URL`:
/// - Signup, login and the access guard's rejection reasons
/// - Role guard on status changes and history
/// - Status workflow and its audit log
/// - Refresh rotation, reuse detection and sign-out
/// - Résumé ownership, ordering and edits
/// - Account deletion
/// - JSON error bodies for malformed requests and unknown routes

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use chrono::Duration;
use common::{TestContext, ACCESS_SECRET};
use resumeflow_shared::auth::jwt::{create_token, Claims, TokenType};
use resumeflow_shared::models::refresh_token::RefreshToken;
use resumeflow_shared::models::resume::{Resume, ResumeStatus};
use resumeflow_shared::models::resume_log::ResumeLog;
use resumeflow_shared::models::user::User;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_health() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx.request(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_signup_login_and_profile() {
    let ctx = TestContext::new().await.unwrap();
    let session = ctx.applicant().await;

    assert_ne!(session.access_token, session.refresh_token);

    let (status, body) = ctx
        .request(Method::GET, "/v1/users/me", Some(&session.access_token), None)
        .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["id"], session.user_id.to_string());
    assert_eq!(body["email"], session.email);
    assert_eq!(body["role"], "APPLICANT");
    assert!(body.get("passwordHash").is_none());
}

#[tokio::test]
async fn test_signup_rejections() {
    let ctx = TestContext::new().await.unwrap();
    let session = ctx.applicant().await;

    let signup = |email: &str, password: &str, confirm: &str| {
        json!({
            "email": email,
            "password": password,
            "confirmPassword": confirm,
            "name": "Someone",
        })
    };

    // Duplicate email
    let (status, body) = ctx
        .request(
            Method::POST,
            "/v1/auth/signup",
            None,
            Some(signup(&session.email, "password123", "password123")),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    // Confirmation mismatch
    let (status, _) = ctx
        .request(
            Method::POST,
            "/v1/auth/signup",
            None,
            Some(signup(&common::unique_email("mismatch"), "password123", "password124")),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Too short
    let (status, _) = ctx
        .request(
            Method::POST,
            "/v1/auth/signup",
            None,
            Some(signup(&common::unique_email("short"), "abc", "abc")),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Missing fields
    let (status, body) = ctx
        .request(Method::POST, "/v1/auth/signup", None, Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn test_login_failures_look_the_same() {
    let ctx = TestContext::new().await.unwrap();
    let session = ctx.applicant().await;

    let (wrong_status, wrong_body) = ctx
        .request(
            Method::POST,
            "/v1/auth/login",
            None,
            Some(json!({ "email": session.email, "password": "not-the-password" })),
        )
        .await;

    let (unknown_status, unknown_body) = ctx
        .request(
            Method::POST,
            "/v1/auth/login",
            None,
            Some(json!({ "email": common::unique_email("nobody"), "password": "password123" })),
        )
        .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body["message"], unknown_body["message"]);
}

#[tokio::test]
async fn test_access_guard_rejection_reasons() {
    let ctx = TestContext::new().await.unwrap();
    let session = ctx.applicant().await;

    // No header
    let (status, body) = ctx.request(Method::GET, "/v1/users/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "no credentials");

    // Wrong scheme
    let request = Request::builder()
        .uri("/v1/users/me")
        .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
        .body(Body::empty())
        .unwrap();
    let (status, body) = ctx.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "unsupported scheme");

    // Garbage token
    let (status, body) = ctx
        .request(Method::GET, "/v1/users/me", Some("not.a.jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "invalid");

    // Refresh token presented as an access token
    let (status, body) = ctx
        .request(Method::GET, "/v1/users/me", Some(&session.refresh_token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "invalid");

    // Expired access token
    let claims = Claims::new(session.user_id, TokenType::Access, Duration::seconds(-60));
    let expired = create_token(&claims, ACCESS_SECRET).unwrap();
    let (status, body) = ctx
        .request(Method::GET, "/v1/users/me", Some(&expired), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "expired");
}

#[tokio::test]
async fn test_access_token_of_deleted_user() {
    let ctx = TestContext::new().await.unwrap();
    let session = ctx.applicant().await;

    RefreshToken::delete_by_user(&ctx.db, session.user_id).await.unwrap();
    assert!(User::delete(&ctx.db, session.user_id).await.unwrap());

    let (status, body) = ctx
        .request(Method::GET, "/v1/users/me", Some(&session.access_token), None)
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "no matching user");
}

#[tokio::test]
async fn test_applicant_cannot_change_status() {
    let ctx = TestContext::new().await.unwrap();
    let applicant = ctx.applicant().await;
    let resume_id = ctx.create_resume(&applicant, "Backend engineer").await;

    let (status, body) = ctx
        .request(
            Method::PATCH,
            &format!("/v1/resumes/{}/status", resume_id),
            Some(&applicant.access_token),
            Some(json!({ "status": "PASS", "reason": "self-approval" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{}", body);

    let (status, _) = ctx
        .request(
            Method::GET,
            &format!("/v1/resumes/{}/logs", resume_id),
            Some(&applicant.access_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Unauthenticated requests stop at the access guard
    let (status, _) = ctx
        .request(
            Method::PATCH,
            &format!("/v1/resumes/{}/status", resume_id),
            None,
            Some(json!({ "status": "PASS", "reason": "x" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let resume = Resume::find_by_id(&ctx.db, resume_id).await.unwrap().unwrap();
    assert_eq!(resume.status, ResumeStatus::Apply);
}

#[tokio::test]
async fn test_recruiter_changes_status_and_reads_history() {
    let ctx = TestContext::new().await.unwrap();
    let applicant = ctx.applicant().await;
    let recruiter = ctx.recruiter().await;
    let resume_id = ctx.create_resume(&applicant, "Backend engineer").await;

    let (status, body) = ctx
        .request(
            Method::PATCH,
            &format!("/v1/resumes/{}/status", resume_id),
            Some(&recruiter.access_token),
            Some(json!({ "status": "PASS", "reason": "strong profile" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["oldStatus"], "APPLY");
    assert_eq!(body["newStatus"], "PASS");
    assert_eq!(body["recruiterId"], recruiter.user_id.to_string());

    let (status, _) = ctx
        .request(
            Method::PATCH,
            &format!("/v1/resumes/{}/status", resume_id),
            Some(&recruiter.access_token),
            Some(json!({ "status": "INTERVIEW1", "reason": "schedule a call" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, logs) = ctx
        .request(
            Method::GET,
            &format!("/v1/resumes/{}/logs", resume_id),
            Some(&recruiter.access_token),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let logs = logs.as_array().unwrap();
    assert_eq!(logs.len(), 2);

    // Newest first
    assert_eq!(logs[0]["oldStatus"], "PASS");
    assert_eq!(logs[0]["newStatus"], "INTERVIEW1");
    assert_eq!(logs[1]["oldStatus"], "APPLY");
    assert_eq!(logs[1]["reason"], "strong profile");
    assert_eq!(logs[0]["recruiterName"], "Test Recruiter");

    // The owner sees the new status
    let (_, resume) = ctx
        .request(
            Method::GET,
            &format!("/v1/resumes/{}", resume_id),
            Some(&applicant.access_token),
            None,
        )
        .await;
    assert_eq!(resume["status"], "INTERVIEW1");
}

#[tokio::test]
async fn test_invalid_status_change_leaves_resume_untouched() {
    let ctx = TestContext::new().await.unwrap();
    let applicant = ctx.applicant().await;
    let recruiter = ctx.recruiter().await;
    let resume_id = ctx.create_resume(&applicant, "Data engineer").await;
    let uri = format!("/v1/resumes/{}/status", resume_id);

    let (status, body) = ctx
        .request(
            Method::PATCH,
            &uri,
            Some(&recruiter.access_token),
            Some(json!({ "status": "MAYBE", "reason": "unsure" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);

    // Lower case is not a status either
    let (status, _) = ctx
        .request(
            Method::PATCH,
            &uri,
            Some(&recruiter.access_token),
            Some(json!({ "status": "pass", "reason": "ok" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx
        .request(
            Method::PATCH,
            &uri,
            Some(&recruiter.access_token),
            Some(json!({ "status": "PASS", "reason": "   " })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let resume = Resume::find_by_id(&ctx.db, resume_id).await.unwrap().unwrap();
    assert_eq!(resume.status, ResumeStatus::Apply);
    assert_eq!(ResumeLog::count_by_resume(&ctx.db, resume_id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_status_of_unknown_resume() {
    let ctx = TestContext::new().await.unwrap();
    let recruiter = ctx.recruiter().await;
    let missing = Uuid::new_v4();

    let (status, _) = ctx
        .request(
            Method::PATCH,
            &format!("/v1/resumes/{}/status", missing),
            Some(&recruiter.access_token),
            Some(json!({ "status": "PASS", "reason": "ok" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .request(
            Method::GET,
            &format!("/v1/resumes/{}/logs", missing),
            Some(&recruiter.access_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_refresh_rotation_and_reuse() {
    let ctx = TestContext::new().await.unwrap();
    let session = ctx.applicant().await;

    let (status, rotated) = ctx
        .request(
            Method::POST,
            "/v1/auth/refresh-token",
            Some(&session.refresh_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", rotated);

    let new_refresh = rotated["refreshToken"].as_str().unwrap().to_string();
    let new_access = rotated["accessToken"].as_str().unwrap().to_string();
    assert_ne!(new_refresh, session.refresh_token);

    // The old token is spent
    let (status, body) = ctx
        .request(
            Method::POST,
            "/v1/auth/refresh-token",
            Some(&session.refresh_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "revoked");

    // An access token is not a refresh token
    let (status, _) = ctx
        .request(Method::POST, "/v1/auth/refresh-token", Some(&new_access), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The replacement works for profile access and rotation
    let (status, _) = ctx
        .request(Method::GET, "/v1/users/me", Some(&new_access), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx
        .request(Method::POST, "/v1/auth/refresh-token", Some(&new_refresh), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_sign_out() {
    let ctx = TestContext::new().await.unwrap();
    let session = ctx.applicant().await;

    let (status, body) = ctx
        .request(Method::POST, "/v1/auth/sign-out", Some(&session.refresh_token), None)
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["id"], session.user_id.to_string());

    assert!(RefreshToken::find_by_user(&ctx.db, session.user_id)
        .await
        .unwrap()
        .is_none());

    // Signed-out token can neither rotate nor sign out again
    let (status, _) = ctx
        .request(Method::POST, "/v1/auth/refresh-token", Some(&session.refresh_token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx
        .request(Method::POST, "/v1/auth/sign-out", Some(&session.refresh_token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Access tokens live until they expire
    let (status, _) = ctx
        .request(Method::GET, "/v1/users/me", Some(&session.access_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_new_login_supersedes_previous_refresh_token() {
    let ctx = TestContext::new().await.unwrap();
    let first = ctx.applicant().await;
    let second = ctx.login(&first.email).await;

    let (status, _) = ctx
        .request(Method::POST, "/v1/auth/refresh-token", Some(&first.refresh_token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx
        .request(Method::POST, "/v1/auth/refresh-token", Some(&second.refresh_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_list_resumes_sort_order() {
    let ctx = TestContext::new().await.unwrap();
    let session = ctx.applicant().await;

    let first = ctx.create_resume(&session, "First").await;
    let second = ctx.create_resume(&session, "Second").await;
    let third = ctx.create_resume(&session, "Third").await;

    let ids = |body: &serde_json::Value| -> Vec<String> {
        body.as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_str().unwrap().to_string())
            .collect()
    };

    let (status, desc) = ctx
        .request(Method::GET, "/v1/resumes", Some(&session.access_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        ids(&desc),
        vec![third.to_string(), second.to_string(), first.to_string()]
    );

    let (_, asc) = ctx
        .request(Method::GET, "/v1/resumes?sort=ASC", Some(&session.access_token), None)
        .await;
    assert_eq!(
        ids(&asc),
        vec![first.to_string(), second.to_string(), third.to_string()]
    );

    // Unrecognized values fall back to newest first
    let (status, fallback) = ctx
        .request(Method::GET, "/v1/resumes?sort=sideways", Some(&session.access_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&fallback), ids(&desc));
}

#[tokio::test]
async fn test_resumes_are_scoped_to_owner() {
    let ctx = TestContext::new().await.unwrap();
    let owner = ctx.applicant().await;
    let other = ctx.applicant().await;
    let resume_id = ctx.create_resume(&owner, "Mine").await;
    let uri = format!("/v1/resumes/{}", resume_id);

    let (status, _) = ctx
        .request(Method::GET, &uri, Some(&other.access_token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .request(
            Method::PUT,
            &uri,
            Some(&other.access_token),
            Some(json!({ "title": "Stolen" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .request(Method::DELETE, &uri, Some(&other.access_token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, list) = ctx
        .request(Method::GET, "/v1/resumes", Some(&other.access_token), None)
        .await;
    assert!(list.as_array().unwrap().is_empty());

    let (status, body) = ctx
        .request(Method::GET, &uri, Some(&owner.access_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Mine");
    assert_eq!(body["name"], "Test Applicant");
    assert_eq!(body["status"], "APPLY");
}

#[tokio::test]
async fn test_update_and_delete_resume() {
    let ctx = TestContext::new().await.unwrap();
    let session = ctx.applicant().await;
    let resume_id = ctx.create_resume(&session, "Original").await;
    let uri = format!("/v1/resumes/{}", resume_id);

    // Empty introduction keeps the stored one
    let (status, body) = ctx
        .request(
            Method::PUT,
            &uri,
            Some(&session.access_token),
            Some(json!({ "title": "Renamed", "introduction": "" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["title"], "Renamed");
    assert_eq!(body["introduction"], "Five years of backend work");

    let (status, _) = ctx
        .request(Method::PUT, &uri, Some(&session.access_token), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = ctx
        .request(Method::DELETE, &uri, Some(&session.access_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], resume_id.to_string());

    let (status, _) = ctx
        .request(Method::GET, &uri, Some(&session.access_token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_account_removes_everything() {
    let ctx = TestContext::new().await.unwrap();
    let applicant = ctx.applicant().await;
    let recruiter = ctx.recruiter().await;
    let resume_id = ctx.create_resume(&applicant, "Soon gone").await;

    let (status, _) = ctx
        .request(
            Method::PATCH,
            &format!("/v1/resumes/{}/status", resume_id),
            Some(&recruiter.access_token),
            Some(json!({ "status": "DROP", "reason": "not a fit" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx
        .request(
            Method::DELETE,
            "/v1/auth/delete-account",
            Some(&applicant.access_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["id"], applicant.user_id.to_string());

    assert!(User::find_by_id(&ctx.db, applicant.user_id).await.unwrap().is_none());
    assert!(Resume::find_by_id(&ctx.db, resume_id).await.unwrap().is_none());
    assert_eq!(ResumeLog::count_by_resume(&ctx.db, resume_id).await.unwrap(), 0);
    assert!(RefreshToken::find_by_user(&ctx.db, applicant.user_id)
        .await
        .unwrap()
        .is_none());

    // The old access token now names nobody
    let (status, body) = ctx
        .request(Method::GET, "/v1/users/me", Some(&applicant.access_token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "no matching user");

    // Deleting requires an access token
    let (status, _) = ctx
        .request(Method::DELETE, "/v1/auth/delete-account", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_requests_get_json_errors() {
    let ctx = TestContext::new().await.unwrap();
    let session = ctx.applicant().await;

    // Résumé ID that is not a UUID
    let (status, body) = ctx
        .request(Method::GET, "/v1/resumes/not-a-uuid", Some(&session.access_token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
    assert_eq!(body["message"], "Resume not found");

    // Body that is not JSON
    let request = Request::builder()
        .method(Method::POST)
        .uri("/v1/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"email\": "))
        .unwrap();
    let (status, body) = ctx.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert_eq!(body["error"], "bad_request");
    assert!(body["message"].is_string());

    // JSON without a Content-Type header
    let request = Request::builder()
        .method(Method::POST)
        .uri("/v1/auth/signup")
        .body(Body::from(
            json!({
                "email": common::unique_email("no-content-type"),
                "password": "password123",
                "confirmPassword": "password123",
                "name": "Someone",
            })
            .to_string(),
        ))
        .unwrap();
    let (status, body) = ctx.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert!(body["message"].is_string());

    // Field of the wrong type
    let (status, body) = ctx
        .request(
            Method::POST,
            "/v1/resumes",
            Some(&session.access_token),
            Some(json!({ "title": 42, "introduction": "x" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn test_unknown_route_gets_json_404() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx.request(Method::GET, "/v1/nowhere", None, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
    assert_eq!(body["error"], "not_found");
}
