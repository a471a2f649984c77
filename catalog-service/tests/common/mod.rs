#![allow(dead_code)]

//! Shared harness for router-level tests

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use catalog_service::config::{Config, PasswordConfig};
use catalog_service::repository::MemoryStore;
use catalog_service::server::app;
use catalog_service::state::AppState;
use serde_json::{json, Value};
use tower::ServiceExt;

pub const EMAIL: &str = "reader@example.com";
pub const PASSWORD: &str = "correct horse";

/// Router over an empty in-memory store, with cheap Argon2 parameters
pub fn test_app() -> Router {
    let mut config = Config::default();
    config.auth.jwt_secret = "test-secret".to_string();
    config.auth.password = PasswordConfig {
        memory_cost_kib: 1024,
        time_cost: 1,
        ..PasswordConfig::default()
    };
    let state = AppState::new(config, MemoryStore::new()).expect("valid test config");
    app(state)
}

/// Status and decoded JSON body of one request
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
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
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

pub async fn get(app: &Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    send(app, Method::GET, uri, token, None).await
}

pub async fn post(app: &Router, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, token, Some(body)).await
}

pub async fn put(app: &Router, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
    send(app, Method::PUT, uri, token, Some(body)).await
}

pub async fn delete(app: &Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    send(app, Method::DELETE, uri, token, None).await
}

/// Register the default reader and return a bearer token
pub async fn login(app: &Router) -> String {
    let credentials = json!({ "email": EMAIL, "password": PASSWORD });
    let (status, _) = post(app, "/register", None, credentials.clone()).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = post(app, "/login", None, credentials).await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

/// Create a record and return its id
pub async fn create(app: &Router, token: &str, uri: &str, body: Value) -> i64 {
    let (status, response) = post(app, uri, Some(token), body).await;
    assert_eq!(status, StatusCode::CREATED, "{response}");
    response["data"]["id"].as_i64().unwrap()
}

/// One author, one category and one publisher to link books against
pub struct Fixtures {
    pub author_id: i64,
    pub category_id: i64,
    pub publisher_id: i64,
}

pub async fn fixtures(app: &Router, token: &str) -> Fixtures {
    Fixtures {
        author_id: create(
            app,
            token,
            "/authors",
            json!({ "first_name": "Ursula", "last_name": "Le Guin" }),
        )
        .await,
        category_id: create(app, token, "/categories", json!({ "name": "Fantasy" })).await,
        publisher_id: create(app, token, "/publishers", json!({ "name": "Ace Books" })).await,
    }
}

pub fn book_body(title: &str, year: i64, fixtures: &Fixtures) -> Value {
    json!({
        "title": title,
        "description": format!("About {title}"),
        "year": year,
        "authorIds": [fixtures.author_id],
        "categoryIds": [fixtures.category_id],
        "publisherId": fixtures.publisher_id,
    })
}
