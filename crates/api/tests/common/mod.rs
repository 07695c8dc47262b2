#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use boxoffice_api::auth::jwt::{generate_access_token, JwtConfig};
use boxoffice_api::config::ServerConfig;
use boxoffice_api::router::build_app_router;
use boxoffice_api::state::AppState;
use boxoffice_core::roles::{ROLE_ADMIN, ROLE_USER};
use boxoffice_core::types::DbId;
use boxoffice_db::models::user::{CreateUser, User};
use boxoffice_db::repositories::UserRepo;
use boxoffice_events::EventBus;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        db_max_connections: 5,
        jwt: JwtConfig {
            secret: "test-secret-for-integration-tests".to_string(),
            access_token_expiry_mins: 60,
        },
    }
}

/// Build the full application router, with the production middleware stack,
/// over the given pool.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState::new(pool, config.clone(), Arc::new(EventBus::default()));
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Identities
// ---------------------------------------------------------------------------

/// A bearer token for `user_id` signed with the test secret.
pub fn token_for(user_id: DbId, role: &str) -> String {
    generate_access_token(user_id, role, &test_config().jwt).expect("token generation")
}

pub async fn create_user(pool: &PgPool, email: &str, role: &str) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            name: email.split('@').next().unwrap_or(email).to_string(),
            role: Some(role.to_string()),
        },
    )
    .await
    .expect("user creation should succeed")
}

/// Seed a regular user and return it with a valid token.
pub async fn user_with_token(pool: &PgPool, email: &str) -> (User, String) {
    let user = create_user(pool, email, ROLE_USER).await;
    let token = token_for(user.id, ROLE_USER);
    (user, token)
}

/// Seed an admin and return it with a valid token.
pub async fn admin_with_token(pool: &PgPool) -> (User, String) {
    let user = create_user(pool, "admin@boxoffice.test", ROLE_ADMIN).await;
    let token = token_for(user.id, ROLE_ADMIN);
    (user, token)
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn patch_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::PATCH, uri, Some(token), Some(body)).await
}

pub async fn patch_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::PATCH, uri, Some(token), None).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Create an event through the API as `admin_token` and return its JSON.
pub async fn create_event(
    pool: &PgPool,
    admin_token: &str,
    title: &str,
    total_seats: i32,
) -> serde_json::Value {
    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/v1/events",
        serde_json::json!({
            "title": title,
            "start_date": "2027-06-01T18:00:00Z",
            "end_date": "2027-06-01T23:00:00Z",
            "total_seats": total_seats,
        }),
        admin_token,
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

/// Ids of an event's seats, in seat order.
pub async fn seat_ids(pool: &PgPool, event_id: i64) -> Vec<i64> {
    let response = get(
        build_test_app(pool.clone()),
        &format!("/api/v1/events/{event_id}/seats"),
    )
    .await;
    body_json(response).await["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|seat| seat["id"].as_i64().unwrap())
        .collect()
}
