//! Drives the full router over an in-memory database.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::Utc;
use serde_json::{Value, json};
use tower::ServiceExt;

use logtime_api::router;
use logtime_api::state::AppStateInner;
use logtime_db::Database;

fn setup_app(require_user: bool) -> Router {
    let db = Database::open_in_memory().expect("Failed to open database");
    router(AppStateInner::new(db, require_user))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, json)
}

async fn send_raw(
    app: &Router,
    uri: &str,
    content_type: Option<&str>,
    body: &str,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).expect("error body is JSON");
    (status, json)
}

async fn register(app: &Router, username: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/users",
        Some(json!({ "username": username, "password": password })),
    )
    .await
}

async fn list(app: &Router) -> Vec<Value> {
    let (status, body) = send(app, "GET", "/logs", None).await;
    assert_eq!(status, StatusCode::OK);
    body.as_array().expect("log list is an array").clone()
}

#[tokio::test]
async fn alice_registers_and_logs_a_message() {
    let app = setup_app(false);

    let (status, user) = register(&app, "alice", "pw123").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user, json!({ "user_id": 1, "username": "alice" }));

    let start = Utc::now();
    let (status, log) = send(
        &app,
        "POST",
        "/logs",
        Some(json!({ "message": "hello", "user_id": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(log["message"], "hello");
    assert_eq!(log["user_id"], 1);
    assert!(log["id"].is_i64());

    let ts: chrono::DateTime<Utc> = log["timestamp"].as_str().unwrap().parse().unwrap();
    assert!(ts >= start);

    let logs = list(&app).await;
    assert_eq!(logs, vec![log]);
}

#[tokio::test]
async fn orphan_log_is_rejected_and_not_stored() {
    let app = setup_app(false);
    send(&app, "POST", "/logs", Some(json!({ "message": "first" }))).await;
    let before = list(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        "/logs",
        Some(json!({ "message": "orphan", "user_id": 999 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    assert_eq!(list(&app).await, before);
}

#[tokio::test]
async fn log_without_user_omits_user_id() {
    let app = setup_app(false);

    let (status, log) = send(&app, "POST", "/logs", Some(json!({ "message": "key: A" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(log.get("user_id").is_none());
    assert_eq!(log["message"], "key: A");
}

#[tokio::test]
async fn require_user_mode_rejects_anonymous_logs() {
    let app = setup_app(true);

    let (status, body) = send(&app, "POST", "/logs", Some(json!({ "message": "anon" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
    assert!(list(&app).await.is_empty());

    register(&app, "bob", "secret").await;
    let (status, _) = send(
        &app,
        "POST",
        "/logs",
        Some(json!({ "message": "owned", "user_id": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn list_returns_every_created_log() {
    let app = setup_app(false);

    let mut created = Vec::new();
    for i in 0..5 {
        let (status, log) = send(
            &app,
            "POST",
            "/logs",
            Some(json!({ "message": format!("key: {}", i) })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        created.push(log["id"].as_i64().unwrap());
    }

    let ids: Vec<i64> = list(&app)
        .await
        .iter()
        .map(|log| log["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, created);
}

#[tokio::test]
async fn duplicate_username_is_a_conflict() {
    let app = setup_app(false);

    let (status, _) = register(&app, "alice", "pw123").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = register(&app, "alice", "other").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "conflict");

    // The next user still gets id 2, so no second alice row was written.
    let (_, carol) = register(&app, "carol", "pw").await;
    assert_eq!(carol["user_id"], 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registration_has_one_winner() {
    let app = setup_app(false);

    let tasks: Vec<_> = (0..10)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move { register(&app, "racer", "pw").await.0 })
        })
        .collect();

    let mut created = 0;
    let mut rejected = 0;
    for task in tasks {
        let status = task.await.unwrap();
        if status == StatusCode::CREATED {
            created += 1;
        } else if status == StatusCode::BAD_REQUEST {
            rejected += 1;
        } else {
            panic!("unexpected status {}", status);
        }
    }
    assert_eq!(created, 1);
    assert_eq!(rejected, 9);
}

#[tokio::test]
async fn password_is_never_echoed() {
    let app = setup_app(false);

    let (_, user) = register(&app, "dave", "hunter2").await;
    let text = user.to_string();
    assert!(!text.contains("hunter2"));
    assert!(user.get("password").is_none());
    assert!(user.get("password_hash").is_none());
}

#[tokio::test]
async fn invalid_input_is_rejected_before_writing() {
    let app = setup_app(false);

    let (status, body) = send(&app, "POST", "/logs", Some(json!({ "message": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation");

    let (status, body) = register(&app, "", "pw").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation");

    assert!(list(&app).await.is_empty());
}

#[tokio::test]
async fn malformed_bodies_use_the_error_format() {
    let app = setup_app(false);

    // Missing required field.
    let (status, body) = send_raw(&app, "/logs", Some("application/json"), "{}").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation");
    assert!(body["message"].as_str().unwrap().contains("message"));

    // Unknown field.
    let (status, body) = send_raw(
        &app,
        "/logs",
        Some("application/json"),
        r#"{"message": "x", "level": "debug"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation");

    // Not JSON at all.
    let (status, body) = send_raw(&app, "/logs", Some("application/json"), "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation");

    // No content type.
    let (status, body) =
        send_raw(&app, "/users", None, r#"{"username":"a","password":"b"}"#).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["error"], "validation");
    assert!(body["message"].is_string());

    assert!(list(&app).await.is_empty());
}

#[tokio::test]
async fn health_reports_ok() {
    let app = setup_app(false);

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".into()));
}
