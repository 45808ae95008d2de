mod edit;
mod page;
pub mod repo;

use axum::{routing::get, Router};

use crate::AppState;

pub use repo::Profile;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(edit::own_profile).put(edit::update_profile))
        .route("/users/{id}", get(page::profile))
}
