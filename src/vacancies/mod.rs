mod applications;
mod apply;
mod crud;
mod listing;
pub mod money;
pub mod projection;
pub mod repo;

use axum::{routing::{get, patch, post}, Router};
use sqlx::SqlitePool;

use crate::{models::Vacancy, session::Principal, AppError, AppResult, AppState};

use projection::Viewer;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(listing::list).post(crud::create))
        .route("/{id}", get(crud::detail).patch(crud::update).delete(crud::remove))
        .route("/{id}/apply", post(apply::apply))
        .route("/{id}/applications", get(applications::list))
        .route("/{id}/applications/{app_id}", patch(applications::decide))
}

/// `/api/applications`: the signed-in student's own applications.
pub fn applications_router() -> Router<AppState> {
    Router::new().route("/", get(applications::mine))
}

/// 404 for a missing vacancy and for someone else's draft.
pub(crate) async fn load_visible(db_pool: &SqlitePool, vacancy_id: &str, principal: &Principal) -> AppResult<Vacancy> {
    repo::load(db_pool, vacancy_id)
        .await?
        .filter(|v| projection::visible_to(v, Some(Viewer::from(principal))))
        .ok_or(AppError::NotFound("vacancy"))
}

/// [`load_visible`], then 403 unless the principal posted it.
pub(crate) async fn load_owned(db_pool: &SqlitePool, vacancy_id: &str, principal: &Principal) -> AppResult<Vacancy> {
    let vacancy = load_visible(db_pool, vacancy_id, principal).await?;
    if !projection::is_owner(&vacancy, Some(Viewer::from(principal))) {
        return Err(AppError::forbidden("only the recruiter who posted this vacancy can do this"));
    }
    Ok(vacancy)
}
