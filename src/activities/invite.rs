use std::collections::BTreeSet;

use axum::{debug_handler, extract::{Path, State}, Extension};
use garde::Validate;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::{
    models::{InvitationStatus, NotificationKind},
    notifications::{self, NewNotification},
    res::{AppJson, Data},
    session::Principal,
    AppError, AppResult,
};

use super::{load_for_participant, repo};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InviteBody {
    #[garde(length(min = 1, max = 50), inner(email))]
    emails: Vec<String>,
    /// Shown by clients; the stored title is what goes into notifications.
    #[garde(length(max = 120))]
    activity_title: Option<String>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InviteOutcome {
    invited: Vec<String>,
    already_participants: Vec<String>,
    not_found: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RespondBody {
    accept: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Responded {
    activity_id: String,
    status: InvitationStatus,
}

#[debug_handler]
pub(crate) async fn invite(
    Path(activity_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    Extension(principal): Extension<Principal>,
    AppJson(body): AppJson<InviteBody>,
) -> AppResult<Data<InviteOutcome>> {
    let activity = load_for_participant(&db_pool, &activity_id, &principal).await?;
    body.validate()?;

    let emails: BTreeSet<String> = body.emails.iter().map(|e| e.trim().to_lowercase()).collect();
    let mut outcome = InviteOutcome::default();

    let mut tx = db_pool.begin().await?;
    for email in emails {
        let invitee: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE email=?")
            .bind(&email)
            .fetch_optional(&mut *tx)
            .await?;
        let Some((invitee_id,)) = invitee else {
            outcome.not_found.push(email);
            continue;
        };

        if repo::is_participant(&mut *tx, &activity.id, &invitee_id).await? {
            outcome.already_participants.push(email);
            continue;
        }

        repo::upsert_invitation(&mut *tx, &activity.id, &invitee_id, &principal.id).await?;
        notifications::notify(&mut *tx, NewNotification {
            user_id: &invitee_id,
            kind: NotificationKind::Invitation,
            title: "Convite para atividade",
            message: format!("{} convidou você para a atividade \"{}\"", principal.name, activity.title),
            link: Some(format!("/activities/{}", activity.id)),
        }).await?;
        outcome.invited.push(email);
    }
    tx.commit().await?;

    tracing::info!(
        %activity_id,
        invited = outcome.invited.len(),
        not_found = outcome.not_found.len(),
        "invitations sent"
    );
    Ok(Data(outcome))
}

#[debug_handler]
pub(crate) async fn respond(
    Path(activity_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    Extension(principal): Extension<Principal>,
    AppJson(RespondBody { accept }): AppJson<RespondBody>,
) -> AppResult<Data<Responded>> {
    let activity = repo::load_activity(&db_pool, &activity_id)
        .await?
        .ok_or(AppError::NotFound("activity"))?;

    let mut tx = db_pool.begin().await?;
    let invitation = repo::pending_invitation(&mut *tx, &activity.id, &principal.id)
        .await?
        .ok_or(AppError::NotFound("invitation"))?;

    let status = if accept { InvitationStatus::Accepted } else { InvitationStatus::Declined };
    repo::set_invitation_status(&mut *tx, &invitation.id, status).await?;
    if accept {
        repo::add_participant(&mut *tx, &activity.id, &principal.id, None).await?;
    }

    let verb = if accept { "aceitou" } else { "recusou" };
    notifications::notify(&mut *tx, NewNotification {
        user_id: &invitation.invited_by,
        kind: NotificationKind::Invitation,
        title: "Resposta ao convite",
        message: format!("{} {verb} o convite para \"{}\"", principal.name, activity.title),
        link: Some(format!("/activities/{}", activity.id)),
    }).await?;
    tx.commit().await?;

    Ok(Data(Responded { activity_id, status }))
}
