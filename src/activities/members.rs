use axum::{debug_handler, extract::{Path, State}, Extension};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::{
    models::{Activity, NotificationKind},
    notifications::{self, NewNotification},
    res::{AppJson, Data},
    session::Principal,
    AppError, AppResult,
};

use super::{load_for_leader, repo};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TransferBody {
    new_leader_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Membership {
    activity_id: String,
    user_id: String,
}

#[debug_handler]
pub(crate) async fn transfer_leadership(
    Path(activity_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    Extension(principal): Extension<Principal>,
    AppJson(TransferBody { new_leader_id }): AppJson<TransferBody>,
) -> AppResult<Data<Activity>> {
    let activity = load_for_leader(&db_pool, &activity_id, &principal).await?;

    if new_leader_id == activity.leader_id {
        return Err(AppError::bad_request("that user already leads this activity"));
    }

    let mut tx = db_pool.begin().await?;

    if !repo::is_participant(&mut *tx, &activity.id, &new_leader_id).await? {
        return Err(AppError::bad_request("the new leader must be a participant"));
    }
    if !repo::set_leader(&mut *tx, &activity.id, &principal.id, &new_leader_id).await? {
        return Err(AppError::conflict("leadership changed concurrently"));
    }

    for user_id in repo::participant_ids(&mut *tx, &activity.id).await? {
        if user_id == principal.id {
            continue;
        }
        let message = if user_id == new_leader_id {
            format!("Você agora lidera a atividade \"{}\"", activity.title)
        } else {
            format!("A liderança da atividade \"{}\" foi transferida", activity.title)
        };
        notifications::notify(&mut *tx, NewNotification {
            user_id: &user_id,
            kind: NotificationKind::ActivityUpdate,
            title: "Nova liderança",
            message,
            link: Some(format!("/activities/{}", activity.id)),
        }).await?;
    }

    tx.commit().await?;
    tracing::info!(%activity_id, from = %principal.id, to = %new_leader_id, "leadership transferred");

    let activity = repo::load_activity(&db_pool, &activity_id)
        .await?
        .ok_or(AppError::NotFound("activity"))?;
    Ok(Data(activity))
}

#[debug_handler]
pub(crate) async fn remove_participant(
    Path((activity_id, user_id)): Path<(String, String)>,
    State(db_pool): State<SqlitePool>,
    Extension(principal): Extension<Principal>,
) -> AppResult<Data<Membership>> {
    let activity = load_for_leader(&db_pool, &activity_id, &principal).await?;

    if user_id == activity.leader_id {
        return Err(AppError::bad_request("the leader cannot be removed; transfer leadership first"));
    }

    let mut tx = db_pool.begin().await?;
    if !repo::remove_participant(&mut *tx, &activity.id, &user_id).await? {
        return Err(AppError::NotFound("participant"));
    }
    notifications::notify(&mut *tx, NewNotification {
        user_id: &user_id,
        kind: NotificationKind::ActivityUpdate,
        title: "Removido da atividade",
        message: format!("Você foi removido da atividade \"{}\"", activity.title),
        link: None,
    }).await?;
    tx.commit().await?;

    tracing::info!(%activity_id, %user_id, by = %principal.id, "participant removed");
    Ok(Data(Membership { activity_id, user_id }))
}

#[debug_handler]
pub(crate) async fn leave(
    Path(activity_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    Extension(principal): Extension<Principal>,
) -> AppResult<Data<Membership>> {
    let activity = repo::load_activity(&db_pool, &activity_id)
        .await?
        .ok_or(AppError::NotFound("activity"))?;

    if activity.leader_id == principal.id {
        return Err(AppError::bad_request("transfer leadership before leaving"));
    }

    let mut tx = db_pool.begin().await?;
    if !repo::remove_participant(&mut *tx, &activity.id, &principal.id).await? {
        return Err(AppError::bad_request("not a participant of this activity"));
    }
    notifications::notify(&mut *tx, NewNotification {
        user_id: &activity.leader_id,
        kind: NotificationKind::ActivityUpdate,
        title: "Participante saiu",
        message: format!("{} saiu da atividade \"{}\"", principal.name, activity.title),
        link: Some(format!("/activities/{}", activity.id)),
    }).await?;
    tx.commit().await?;

    tracing::info!(%activity_id, user_id = %principal.id, "participant left");
    Ok(Data(Membership { activity_id, user_id: principal.id }))
}
