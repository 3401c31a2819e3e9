//! Integration tests for the JSON API routes.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use idea_board::config::Config;
use idea_board::db::Database;
use idea_board::web::{create_app, AppState};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

async fn setup_app() -> (Router, TempDir) {
    let (app, _db, temp_dir) = setup_app_with_db().await;
    (app, temp_dir)
}

async fn setup_app_with_db() -> (Router, Database, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db = Database::new(&temp_dir.path().join("test.db"))
        .await
        .expect("Failed to create database");
    let config = Config::from_env().expect("Failed to create config");

    let state = AppState {
        db: db.clone(),
        config: Arc::new(config),
    };
    (create_app(state), db, temp_dir)
}

struct Reply {
    status: StatusCode,
    cookie: Option<String>,
    body: Value,
}

async fn send(app: &Router, request: Request<Body>) -> Reply {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(String::from);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    Reply {
        status,
        cookie,
        body,
    }
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn send_json(method: &str, uri: &str, cookie: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Register a user and return its session cookie (`session=...`).
async fn register(app: &Router, username: &str) -> String {
    let reply = send(
        app,
        send_json(
            "POST",
            "/api/register",
            None,
            &json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "password": "correct horse",
            }),
        ),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK, "register failed: {}", reply.body);
    reply.cookie.expect("no session cookie")
}

async fn post_idea(app: &Router, cookie: &str, title: &str) -> i64 {
    let reply = send(
        app,
        send_json(
            "POST",
            "/api/ideas",
            Some(cookie),
            &json!({
                "title": title,
                "description": "desc",
                "category": "tech",
            }),
        ),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK, "create failed: {}", reply.body);
    reply.body["idea"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health() {
    let (app, _temp_dir) = setup_app().await;
    let response = app.oneshot(get("/healthz", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_empty_feed_shape() {
    let (app, _temp_dir) = setup_app().await;

    let reply = send(&app, get("/api/ideas", None)).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["ideas"], json!([]));
    assert_eq!(
        reply.body["pagination"],
        json!({ "page": 1, "limit": 10, "total": 0, "totalPages": 0 })
    );
}

#[tokio::test]
async fn test_feed_query_fallbacks() {
    let (app, _temp_dir) = setup_app().await;

    let reply = send(&app, get("/api/ideas?page=-2&limit=abc&category=tech", None)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["pagination"]["page"], 1);
    assert_eq!(reply.body["pagination"]["limit"], 10);

    let reply = send(&app, get("/api/ideas?page=2&limit=9", None)).await;
    assert_eq!(reply.body["pagination"]["page"], 2);
    assert_eq!(reply.body["pagination"]["limit"], 9);
}

#[tokio::test]
async fn test_mutations_require_authentication() {
    let (app, _temp_dir) = setup_app().await;
    let cookie = register(&app, "author").await;
    let idea_id = post_idea(&app, &cookie, "Protected").await;

    let like = send(
        &app,
        Request::builder()
            .method("POST")
            .uri(format!("/api/ideas/{idea_id}/like"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(like.status, StatusCode::UNAUTHORIZED);
    assert!(like.body["error"].is_string());

    let comment = send(
        &app,
        send_json(
            "POST",
            &format!("/api/ideas/{idea_id}/comments"),
            None,
            &json!({ "content": "hi" }),
        ),
    )
    .await;
    assert_eq!(comment.status, StatusCode::UNAUTHORIZED);

    let create = send(
        &app,
        send_json(
            "POST",
            "/api/ideas",
            Some("session=forged-token"),
            &json!({ "title": "t", "description": "d", "category": "c" }),
        ),
    )
    .await;
    assert_eq!(create.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_idea_is_404() {
    let (app, _temp_dir) = setup_app().await;

    let reply = send(&app, get("/api/ideas/12345", None)).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert!(reply.body["error"].is_string());
}

#[tokio::test]
async fn test_full_interaction_flow() {
    let (app, _temp_dir) = setup_app().await;
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;

    let idea_id = post_idea(&app, &alice, "Neighbourhood tool library").await;
    let like_uri = format!("/api/ideas/{idea_id}/like");
    let like = || {
        Request::builder()
            .method("POST")
            .uri(like_uri.as_str())
            .header(header::COOKIE, bob.as_str())
            .body(Body::empty())
            .unwrap()
    };

    let first = send(&app, like()).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["liked"], true);
    assert_eq!(first.body["likes_count"], 1);

    let as_bob = send(&app, get(&format!("/api/ideas/{idea_id}"), Some(bob.as_str()))).await;
    assert_eq!(as_bob.body["idea"]["user_liked"], true);
    assert_eq!(as_bob.body["idea"]["likes_count"], 1);

    let second = send(&app, like()).await;
    assert_eq!(second.body["liked"], false);
    assert_eq!(second.body["likes_count"], 0);

    let comment = send(
        &app,
        send_json(
            "POST",
            &format!("/api/ideas/{idea_id}/comments"),
            Some(bob.as_str()),
            &json!({ "content": "nice idea" }),
        ),
    )
    .await;
    assert_eq!(comment.status, StatusCode::OK);
    assert_eq!(comment.body["comment"]["content"], "nice idea");
    assert_eq!(comment.body["comment"]["username"], "bob");

    let anonymous = send(&app, get(&format!("/api/ideas/{idea_id}"), None)).await;
    assert_eq!(anonymous.status, StatusCode::OK);
    assert_eq!(anonymous.body["idea"]["user_liked"], false);
    assert_eq!(anonymous.body["idea"]["likes_count"], 0);
    assert_eq!(anonymous.body["idea"]["comments_count"], 1);
    assert_eq!(anonymous.body["idea"]["username"], "alice");

    let comments = send(&app, get(&format!("/api/ideas/{idea_id}/comments"), None)).await;
    assert_eq!(comments.body["comments"].as_array().unwrap().len(), 1);

    let feed = send(&app, get("/api/ideas", Some(alice.as_str()))).await;
    assert_eq!(feed.body["pagination"]["total"], 1);
    assert_eq!(feed.body["ideas"][0]["id"], idea_id);
    assert_eq!(feed.body["ideas"][0]["comments_count"], 1);
}

#[tokio::test]
async fn test_empty_comment_is_400() {
    let (app, _temp_dir) = setup_app().await;
    let cookie = register(&app, "writer").await;
    let idea_id = post_idea(&app, &cookie, "Quiet idea").await;

    let reply = send(
        &app,
        send_json(
            "POST",
            &format!("/api/ideas/{idea_id}/comments"),
            Some(cookie.as_str()),
            &json!({ "content": "   " }),
        ),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let comments = send(&app, get(&format!("/api/ideas/{idea_id}/comments"), None)).await;
    assert_eq!(comments.body["comments"], json!([]));
}

#[tokio::test]
async fn test_update_is_owner_only() {
    let (app, _temp_dir) = setup_app().await;
    let owner = register(&app, "owner").await;
    let other = register(&app, "other").await;
    let idea_id = post_idea(&app, &owner, "Original").await;
    let uri = format!("/api/ideas/{idea_id}");
    let changes = json!({ "title": "Changed", "description": "d", "category": "c" });

    let denied = send(&app, send_json("PUT", &uri, Some(other.as_str()), &changes)).await;
    assert_eq!(denied.status, StatusCode::NOT_FOUND);

    let allowed = send(&app, send_json("PUT", &uri, Some(owner.as_str()), &changes)).await;
    assert_eq!(allowed.status, StatusCode::OK);

    let idea = send(&app, get(&uri, None)).await;
    assert_eq!(idea.body["idea"]["title"], "Changed");
}

#[tokio::test]
async fn test_session_lifecycle() {
    let (app, _temp_dir) = setup_app().await;

    let anonymous = send(&app, get("/api/user", None)).await;
    assert_eq!(anonymous.body, json!({ "user": null }));

    let cookie = register(&app, "mona").await;
    let me = send(&app, get("/api/user", Some(cookie.as_str()))).await;
    assert_eq!(me.body["user"]["username"], "mona");
    assert!(me.body["user"].get("password_hash").is_none());

    let logout = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/api/logout")
            .header(header::COOKIE, cookie.as_str())
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(logout.status, StatusCode::OK);
    assert_eq!(logout.cookie.as_deref(), Some("session="));

    let after = send(&app, get("/api/user", Some(cookie.as_str()))).await;
    assert_eq!(after.body, json!({ "user": null }));

    let login = send(
        &app,
        send_json(
            "POST",
            "/api/login",
            None,
            &json!({ "email": "mona@example.com", "password": "correct horse" }),
        ),
    )
    .await;
    assert_eq!(login.status, StatusCode::OK);
    let new_cookie = login.cookie.expect("no cookie after login");
    let me = send(&app, get("/api/user", Some(new_cookie.as_str()))).await;
    assert_eq!(me.body["user"]["email"], "mona@example.com");

    let bad_login = send(
        &app,
        send_json(
            "POST",
            "/api/login",
            None,
            &json!({ "email": "mona@example.com", "password": "nope nope" }),
        ),
    )
    .await;
    assert_eq!(bad_login.status, StatusCode::BAD_REQUEST);
}

fn raw_post(
    uri: &str,
    cookie: Option<&str>,
    content_type: Option<&str>,
    body: &str,
) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn test_anonymous_post_without_json_is_401() {
    let (app, _temp_dir) = setup_app().await;
    let cookie = register(&app, "author").await;
    let idea_id = post_idea(&app, &cookie, "Guarded").await;

    let create = send(&app, raw_post("/api/ideas", None, None, "")).await;
    assert_eq!(create.status, StatusCode::UNAUTHORIZED);
    assert_eq!(create.body["error"], "authentication required");

    let comment = send(
        &app,
        raw_post(
            &format!("/api/ideas/{idea_id}/comments"),
            None,
            Some("application/x-www-form-urlencoded"),
            "content=hi",
        ),
    )
    .await;
    assert_eq!(comment.status, StatusCode::UNAUTHORIZED);
    assert!(comment.body["error"].is_string());

    let like = send(&app, raw_post("/api/ideas/abc/like", None, None, "")).await;
    assert_eq!(like.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_numeric_idea_id_is_404() {
    let (app, _temp_dir) = setup_app().await;
    let cookie = register(&app, "reader").await;

    for uri in ["/api/ideas/abc", "/api/ideas/abc/comments"] {
        let reply = send(&app, get(uri, None)).await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(reply.body["error"], "idea not found", "{uri}");
    }

    let like = send(&app, raw_post("/api/ideas/abc/like", Some(cookie.as_str()), None, "")).await;
    assert_eq!(like.status, StatusCode::NOT_FOUND);
    assert!(like.body["error"].is_string());
}

#[tokio::test]
async fn test_malformed_bodies_are_json_400() {
    let (app, _temp_dir) = setup_app().await;
    let cookie = register(&app, "writer").await;

    let register_reply = send(
        &app,
        raw_post("/api/register", None, Some("application/json"), "{not json"),
    )
    .await;
    assert_eq!(register_reply.status, StatusCode::BAD_REQUEST);
    assert!(register_reply.body["error"].is_string());

    let login_reply = send(&app, raw_post("/api/login", None, None, "email=a")).await;
    assert_eq!(login_reply.status, StatusCode::BAD_REQUEST);
    assert!(login_reply.body["error"].is_string());

    let create = send(
        &app,
        raw_post(
            "/api/ideas",
            Some(cookie.as_str()),
            Some("application/json"),
            r#"{"title": 5}"#,
        ),
    )
    .await;
    assert_eq!(create.status, StatusCode::BAD_REQUEST);
    assert!(create.body["error"].is_string());
}

#[tokio::test]
async fn test_session_store_failure_is_500() {
    let (app, db, _temp_dir) = setup_app_with_db().await;

    sqlx::query("DROP TABLE sessions")
        .execute(db.pool())
        .await
        .unwrap();

    let reply = send(&app, get("/api/user", Some("session=some-token"))).await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.body["error"], "internal server error");

    // Requests without a session cookie never touch the sessions table.
    let anonymous = send(&app, get("/api/user", None)).await;
    assert_eq!(anonymous.status, StatusCode::OK);
}
