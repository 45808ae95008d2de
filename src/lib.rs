pub mod activities;
pub mod appresult;
pub mod auth;
pub mod config;
pub mod db;
pub mod medals;
pub mod models;
pub mod notifications;
pub mod profiles;
pub mod res;
pub mod session;
pub mod vacancies;
pub mod validate;

use std::sync::Arc;

use axum::{extract::FromRef, middleware, routing::get, Json, Router};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use appresult::{AppError, AppResult, FieldErrors};
pub use config::Config;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub config: Arc<Config>,
}

/// Every route that needs a signed-in user, without the principal middleware.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .nest("/activities", activities::router())
        .nest("/vacancies", vacancies::router())
        .nest("/applications", vacancies::applications_router())
        .nest("/notifications", notifications::router())
        .nest("/medals", medals::router())
        .merge(profiles::router())
}

/// The whole API. Expects a `tower_sessions` layer on top.
pub fn app(state: AppState) -> Router {
    let protected = protected_routes()
        .layer(middleware::from_fn_with_state(state.clone(), session::require_principal));

    Router::new()
        .route("/health", get(health))
        .nest("/api", auth::router().merge(protected))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
