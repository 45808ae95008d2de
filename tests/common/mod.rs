#![allow(dead_code)]

use std::{str::FromStr, sync::Arc};

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Extension, Router,
};
use http_body_util::BodyExt;
use needuk::{
    db,
    models::UserType,
    protected_routes,
    session::{self, Principal},
    AppState, Config,
};
use serde_json::Value;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use tower::ServiceExt;

/// One in-memory database per test. A single connection that never expires
/// keeps the database alive for the whole test.
pub async fn pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let db_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .unwrap();
    db::migrate(&db_pool).await.unwrap();
    db_pool
}

pub fn state(db_pool: &SqlitePool) -> AppState {
    let config = Config::from_lookup(|key| (key == "NEEDUK_DEV_LOGIN").then(|| "true".to_owned())).unwrap();
    AppState {
        db_pool: db_pool.clone(),
        config: Arc::new(config),
    }
}

pub async fn seed_user(db_pool: &SqlitePool, name: &str, user_type: UserType, curso: Option<&str>) -> Principal {
    let id = db::new_id();
    let now = db::now().unwrap();
    let email = format!("{}@needuk.test", name.to_lowercase().replace(' ', "."));
    let (company, university) = match user_type {
        UserType::Recrutador => (Some("ACME Ltda"), None),
        UserType::Gestor => (None, Some("UFPE")),
        UserType::Aluno => (None, None),
    };

    sqlx::query(
        "INSERT INTO users (id,name,email,user_type,curso,university,company,created_at,updated_at)
         VALUES (?,?,?,?,?,?,?,?,?)",
    )
        .bind(&id)
        .bind(name)
        .bind(&email)
        .bind(user_type)
        .bind(curso)
        .bind(university)
        .bind(company)
        .bind(&now)
        .bind(&now)
        .execute(db_pool)
        .await
        .unwrap();

    session::load_principal(db_pool, &id).await.unwrap().unwrap()
}

pub async fn student(db_pool: &SqlitePool, name: &str) -> Principal {
    seed_user(db_pool, name, UserType::Aluno, Some("Ciência da Computação")).await
}

pub async fn recruiter(db_pool: &SqlitePool, name: &str) -> Principal {
    seed_user(db_pool, name, UserType::Recrutador, None).await
}

pub async fn manager(db_pool: &SqlitePool, name: &str) -> Principal {
    seed_user(db_pool, name, UserType::Gestor, None).await
}

/// The protected API as seen by `principal`, without the session layer.
pub fn as_user(db_pool: &SqlitePool, principal: &Principal) -> Router {
    protected_routes()
        .layer(Extension(principal.clone()))
        .with_state(state(db_pool))
}

pub async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

pub async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    send(router, Method::GET, uri, None).await
}

pub async fn post(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(router, Method::POST, uri, Some(body)).await
}

pub async fn put(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(router, Method::PUT, uri, Some(body)).await
}

pub async fn patch(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(router, Method::PATCH, uri, Some(body)).await
}

pub async fn delete(router: &Router, uri: &str) -> (StatusCode, Value) {
    send(router, Method::DELETE, uri, None).await
}

pub async fn unread_count(db_pool: &SqlitePool, user_id: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id=? AND read=0")
        .bind(user_id)
        .fetch_one(db_pool)
        .await
        .unwrap()
}
