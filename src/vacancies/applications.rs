use axum::{debug_handler, extract::{Path, State}, Extension};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{
    models::{ApplicationStatus, NotificationKind, VacancyApplication},
    notifications::{self, NewNotification},
    res::{AppJson, Data},
    session::Principal,
    AppError, AppResult,
};

use super::{load_owned, repo::{self, ApplicantRow, OwnApplicationRow}};

#[derive(Debug, Deserialize)]
pub(crate) struct DecisionBody {
    status: ApplicationStatus,
}

#[debug_handler]
pub(crate) async fn list(
    Path(vacancy_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    Extension(principal): Extension<Principal>,
) -> AppResult<Data<Vec<ApplicantRow>>> {
    let vacancy = load_owned(&db_pool, &vacancy_id, &principal).await?;
    Ok(Data(repo::list_applicants(&db_pool, &vacancy.id).await?))
}

#[debug_handler]
pub(crate) async fn decide(
    Path((vacancy_id, application_id)): Path<(String, String)>,
    State(db_pool): State<SqlitePool>,
    Extension(principal): Extension<Principal>,
    AppJson(body): AppJson<DecisionBody>,
) -> AppResult<Data<VacancyApplication>> {
    if body.status == ApplicationStatus::Pending {
        return Err(AppError::bad_request("status must be ACCEPTED or REJECTED"));
    }
    let vacancy = load_owned(&db_pool, &vacancy_id, &principal).await?;

    let mut tx = db_pool.begin().await?;
    let application = repo::load_application(&mut *tx, &vacancy.id, &application_id)
        .await?
        .ok_or(AppError::NotFound("application"))?;

    if !repo::decide(&mut *tx, &application.id, body.status, &principal.id).await? {
        return Err(AppError::conflict("this application was already decided"));
    }
    let application = repo::load_application(&mut *tx, &vacancy.id, &application_id)
        .await?
        .ok_or(AppError::NotFound("application"))?;

    let (title, verdict) = match body.status {
        ApplicationStatus::Accepted => ("Candidatura aceita", "aceita"),
        _ => ("Candidatura recusada", "recusada"),
    };
    notifications::notify(&mut *tx, NewNotification {
        user_id: &application.applicant_id,
        kind: NotificationKind::ApplicationDecision,
        title,
        message: format!("Sua candidatura para \"{}\" foi {verdict}", vacancy.title),
        link: Some(format!("/vacancies/{}", vacancy.id)),
    }).await?;
    tx.commit().await?;

    tracing::info!(%vacancy_id, %application_id, status = ?body.status, by = %principal.id, "application decided");
    Ok(Data(application))
}

#[debug_handler]
pub(crate) async fn mine(
    State(db_pool): State<SqlitePool>,
    Extension(principal): Extension<Principal>,
) -> AppResult<Data<Vec<OwnApplicationRow>>> {
    Ok(Data(repo::list_own_applications(&db_pool, &principal.id).await?))
}
