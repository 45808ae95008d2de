mod award;
pub mod repo;

use axum::{routing::{get, post}, Router};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/award", post(award::award))
        .route("/{user_id}", get(award::received))
}
