//! Handler tests for the Users domain
//!
//! The users router runs behind the JWT middleware, backed by the in-memory
//! store, so these cover:
//! - Authentication (401 before any handler runs)
//! - Request/response JSON and status codes
//! - Display zone selection via `x-time-zone`

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::middleware;
use axum_helpers::{JwtConfig, JwtVerifier, jwt_auth_middleware};
use chrono::DateTime;
use core_config::locale::DisplayConfig;
use domain_users::{InMemoryUserStore, UserService, handlers};
use http_body_util::BodyExt;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt; // For oneshot()

const SECRET: &str = "handler-test-secret-that-is-long-enough";

fn app(store: &InMemoryUserStore) -> Router {
    let verifier = Arc::new(JwtVerifier::new(&JwtConfig::with_secret(SECRET)).unwrap());
    let service = UserService::new(store.command_repository(), store.query_repository());

    handlers::router(service, DisplayConfig::default())
        .layer(middleware::from_fn_with_state(verifier, jwt_auth_middleware))
}

fn token_with_secret(secret: &str) -> String {
    let exp = (chrono::Utc::now() + chrono::Duration::minutes(5)).timestamp();
    encode(
        &Header::default(),
        &json!({ "sub": "admin", "exp": exp, "groups": ["admins"] }),
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

fn bearer() -> String {
    format!("Bearer {}", token_with_secret(SECRET))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, bearer())
        .body(Body::empty())
        .unwrap()
}

fn send_json(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, bearer())
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// Helper to parse JSON response body
async fn json_body(body: Body) -> Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn create(app: &Router, name: &str, email: &str) -> Value {
    let response = app
        .clone()
        .oneshot(send_json("POST", "/", json!({ "name": name, "email": email })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response.into_body()).await
}

#[tokio::test]
async fn test_missing_token_returns_401() {
    let store = InMemoryUserStore::new();
    let app = app(&store);

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "name": "Ana", "email": "ana@example.com" }).to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_token_with_wrong_signature_returns_401() {
    let store = InMemoryUserStore::new();
    let app = app(&store);

    let request = Request::builder()
        .uri("/count")
        .header(
            header::AUTHORIZATION,
            format!("Bearer {}", token_with_secret("some-other-secret-of-enough-length")),
        )
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["error"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_create_user_returns_201() {
    let store = InMemoryUserStore::new();
    let app = app(&store);

    let response = app
        .oneshot(send_json(
            "POST",
            "/",
            json!({ "name": "Ana", "email": "ana@example.com", "ignored": true }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers()[header::CONTENT_LANGUAGE], "es-ES");

    let body = json_body(response.into_body()).await;
    assert_eq!(body["name"], "Ana");
    assert_eq!(body["version"], 0);
    assert_eq!(body["createdAt"], body["updatedAt"]);

    // Rendered in Europe/Madrid: CET or CEST
    let created = DateTime::parse_from_rfc3339(body["createdAt"].as_str().unwrap()).unwrap();
    assert!([3600, 7200].contains(&created.offset().local_minus_utc()));
}

#[tokio::test]
async fn test_create_user_duplicate_email_returns_400() {
    let store = InMemoryUserStore::new();
    let app = app(&store);
    create(&app, "Ana", "ana@example.com").await;

    let response = app
        .oneshot(send_json(
            "POST",
            "/",
            json!({ "name": "Ana Again", "email": "ana@example.com" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["message"], "Email already exists: ana@example.com");
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_create_user_validates_input() {
    let store = InMemoryUserStore::new();
    let app = app(&store);

    let response = app
        .oneshot(send_json("POST", "/", json!({ "name": "", "email": "nope" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_get_user_not_found_and_bad_id() {
    let store = InMemoryUserStore::new();
    let app = app(&store);

    let response = app.clone().oneshot(get("/42")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.oneshot(get("/not-a-number")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rename_then_read() {
    let store = InMemoryUserStore::new();
    let app = app(&store);
    let created = create(&app, "Ana", "ana@example.com").await;
    let id = created["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(send_json("PATCH", &format!("/{}", id), json!({ "name": "X" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = json_body(response.into_body()).await;
    assert_eq!(updated["version"], 1);

    let response = app.oneshot(get(&format!("/{}", id))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let found = json_body(response.into_body()).await;

    assert_eq!(found["name"], "X");
    assert!(found.get("version").is_none());
    let before = DateTime::parse_from_rfc3339(created["updatedAt"].as_str().unwrap()).unwrap();
    let after = DateTime::parse_from_rfc3339(found["updatedAt"].as_str().unwrap()).unwrap();
    assert!(after > before);
}

#[tokio::test]
async fn test_rename_missing_user_returns_404() {
    let store = InMemoryUserStore::new();
    let app = app(&store);

    let response = app
        .oneshot(send_json("PATCH", "/7", json!({ "name": "X" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_user_returns_204() {
    let store = InMemoryUserStore::new();
    let app = app(&store);
    let created = create(&app, "Ana", "ana@example.com").await;
    let uri = format!("/{}", created["id"]);

    let request = Request::builder()
        .method("DELETE")
        .uri(&uri)
        .header(header::AUTHORIZATION, bearer())
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.clone().oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.oneshot(get("/count")).await.unwrap();
    let body = json_body(response.into_body()).await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_time_zone_header() {
    let store = InMemoryUserStore::new();
    let app = app(&store);
    let created = create(&app, "Ana", "ana@example.com").await;
    let uri = format!("/{}", created["id"]);

    let request = Request::builder()
        .uri(&uri)
        .header(header::AUTHORIZATION, bearer())
        .header("x-time-zone", "UTC")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response.into_body()).await;
    assert!(body["createdAt"].as_str().unwrap().ends_with("+00:00"));

    let request = Request::builder()
        .uri(&uri)
        .header(header::AUTHORIZATION, bearer())
        .header("x-time-zone", "Mars/Olympus_Mons")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_search_and_recent() {
    let store = InMemoryUserStore::new();
    let app = app(&store);
    for (name, email) in [
        ("Mariana", "mariana@example.com"),
        ("Pedro", "pedro@example.com"),
        ("Juliana", "juliana@example.com"),
    ] {
        create(&app, name, email).await;
    }

    let response = app.clone().oneshot(get("/?page=0&size=2")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let page = json_body(response.into_body()).await;
    assert_eq!(page["content"].as_array().unwrap().len(), 2);
    assert_eq!(page["totalElements"], 3);
    assert_eq!(page["totalPages"], 2);

    let response = app.clone().oneshot(get("/?size=0")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(get("/?page=9223372036854775807&size=20"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.clone().oneshot(get("/search?name=ana")).await.unwrap();
    let found = json_body(response.into_body()).await;
    let names: Vec<_> = found
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Mariana", "Juliana"]);

    let response = app.clone().oneshot(get("/recent?limit=2")).await.unwrap();
    let recent = json_body(response.into_body()).await;
    assert_eq!(recent.as_array().unwrap().len(), 2);
    assert_eq!(recent[0]["name"], "Juliana");

    let response = app.clone().oneshot(get("/recent?limit=0")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.oneshot(get("/by-email?email=pedro@example.com")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let pedro = json_body(response.into_body()).await;
    assert_eq!(pedro["name"], "Pedro");
}
