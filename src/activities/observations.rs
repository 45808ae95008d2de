use axum::{debug_handler, extract::{Path, State}, Extension};
use garde::Validate;
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{
    models::{NotificationKind, Observation},
    notifications::{self, NewNotification},
    res::{AppJson, Created, Data},
    session::Principal,
    validate,
    AppResult,
};

use super::{load_for_participant, repo};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ObservationBody {
    #[garde(length(max = 2000), custom(validate::not_blank))]
    content: String,
}

#[debug_handler]
pub(crate) async fn list(
    Path(activity_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    Extension(principal): Extension<Principal>,
) -> AppResult<Data<Vec<Observation>>> {
    load_for_participant(&db_pool, &activity_id, &principal).await?;
    Ok(Data(repo::list_observations(&db_pool, &activity_id).await?))
}

#[debug_handler]
pub(crate) async fn create(
    Path(activity_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    Extension(principal): Extension<Principal>,
    AppJson(body): AppJson<ObservationBody>,
) -> AppResult<Created<Vec<Observation>>> {
    let activity = load_for_participant(&db_pool, &activity_id, &principal).await?;
    body.validate()?;

    let mut tx = db_pool.begin().await?;
    repo::insert_observation(&mut *tx, &activity.id, &principal.id, body.content.trim()).await?;
    for user_id in repo::participant_ids(&mut *tx, &activity.id).await? {
        if user_id == principal.id {
            continue;
        }
        notifications::notify(&mut *tx, NewNotification {
            user_id: &user_id,
            kind: NotificationKind::ActivityUpdate,
            title: "Nova observação",
            message: format!("{} comentou em \"{}\"", principal.name, activity.title),
            link: Some(format!("/activities/{}", activity.id)),
        }).await?;
    }
    tx.commit().await?;

    Ok(Created(repo::list_observations(&db_pool, &activity_id).await?))
}
