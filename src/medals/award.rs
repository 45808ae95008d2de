use axum::{debug_handler, extract::{Path, State}, Extension};
use garde::Validate;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::{
    activities,
    models::{BadgeAward, MedalType, NotificationKind, UserType},
    notifications::{self, NewNotification},
    profiles,
    res::{AppJson, Created, Data},
    session::Principal,
    validate::clean,
    AppError, AppResult,
};

use super::repo::{self, NewAward};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AwardBody {
    #[garde(skip)]
    medal_type: MedalType,
    #[garde(length(min = 1))]
    user_id: String,
    #[garde(length(min = 1))]
    activity_id: Option<String>,
    #[garde(length(max = 500))]
    reason: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Awarded {
    id: String,
    user_id: String,
    medal_type: MedalType,
}

fn medal_label(medal_type: MedalType) -> &'static str {
    match medal_type {
        MedalType::Gold => "ouro",
        MedalType::Silver => "prata",
        MedalType::Bronze => "bronze",
    }
}

#[debug_handler]
pub(crate) async fn award(
    State(db_pool): State<SqlitePool>,
    Extension(principal): Extension<Principal>,
    AppJson(body): AppJson<AwardBody>,
) -> AppResult<Created<Awarded>> {
    if !principal.is(UserType::Gestor) {
        return Err(AppError::forbidden("only managers award medals"));
    }
    body.validate()?;

    let mut tx = db_pool.begin().await?;

    let student = profiles::repo::load_user(&mut *tx, &body.user_id)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    if student.user_type != UserType::Aluno {
        return Err(AppError::bad_request("medals are awarded to students only"));
    }

    let activity_title = match &body.activity_id {
        Some(activity_id) => Some(
            activities::repo::load_activity(&mut *tx, activity_id)
                .await?
                .ok_or(AppError::NotFound("activity"))?
                .title,
        ),
        None => None,
    };

    let reason = clean(body.reason);
    let id = repo::insert_award(&mut tx, NewAward {
        user_id: &student.id,
        awarded_by: &principal.id,
        activity_id: body.activity_id.as_deref(),
        medal_type: body.medal_type,
        reason: reason.clone(),
    }).await?;

    let mut message = format!("{} concedeu a você uma medalha de {}", principal.name, medal_label(body.medal_type));
    if let Some(title) = &activity_title {
        message += &format!(" pela atividade \"{title}\"");
    }
    if let Some(reason) = &reason {
        message += &format!(": {reason}");
    }
    notifications::notify(&mut *tx, NewNotification {
        user_id: &student.id,
        kind: NotificationKind::MedalAwarded,
        title: "Nova medalha",
        message,
        link: Some(format!("/users/{}", student.id)),
    }).await?;

    tx.commit().await?;
    tracing::info!(%id, student = %student.id, gestor = %principal.id, medal = ?body.medal_type, "medal awarded");

    Ok(Created(Awarded { id, user_id: student.id, medal_type: body.medal_type }))
}

#[debug_handler]
pub(crate) async fn received(
    Path(user_id): Path<String>,
    State(db_pool): State<SqlitePool>,
) -> AppResult<Data<Vec<BadgeAward>>> {
    if profiles::repo::load_user(&db_pool, &user_id).await?.is_none() {
        return Err(AppError::NotFound("user"));
    }
    Ok(Data(repo::list_awards(&db_pool, &user_id).await?))
}
