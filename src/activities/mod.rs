mod crud;
mod invite;
mod members;
mod observations;
pub mod repo;

use axum::{routing::{delete, get, post}, Router};

use crate::{models::Activity, session::Principal, AppError, AppResult, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(crud::list).post(crud::create))
        .route("/{id}", get(crud::detail).put(crud::update).delete(crud::remove))
        .route("/{id}/transfer-leadership", post(members::transfer_leadership))
        .route("/{id}/participants/{user_id}", delete(members::remove_participant))
        .route("/{id}/leave", post(members::leave))
        .route("/{id}/invite", post(invite::invite))
        .route("/{id}/invitation", post(invite::respond))
        .route("/{id}/observations", get(observations::list).post(observations::create))
}

/// 404 when the activity is missing, 403 when the principal is not a participant.
pub(crate) async fn load_for_participant(
    db_pool: &sqlx::SqlitePool,
    activity_id: &str,
    principal: &Principal,
) -> AppResult<Activity> {
    let activity = repo::load_activity(db_pool, activity_id)
        .await?
        .ok_or(AppError::NotFound("activity"))?;

    if !repo::is_participant(db_pool, activity_id, &principal.id).await? {
        return Err(AppError::forbidden("only participants can access this activity"));
    }
    Ok(activity)
}

/// 404 when the activity is missing, 403 unless the principal leads it.
pub(crate) async fn load_for_leader(
    db_pool: &sqlx::SqlitePool,
    activity_id: &str,
    principal: &Principal,
) -> AppResult<Activity> {
    let activity = repo::load_activity(db_pool, activity_id)
        .await?
        .ok_or(AppError::NotFound("activity"))?;

    if activity.leader_id != principal.id {
        return Err(AppError::forbidden("only the activity leader can do this"));
    }
    Ok(activity)
}
