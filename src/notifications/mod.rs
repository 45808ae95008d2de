mod list;
mod mark_read;
pub mod repo;

use axum::{routing::get, Router};

use crate::AppState;

pub use repo::{notify, NewNotification};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list::list).put(mark_read::mark_read))
}
