use axum::{body::Bytes, debug_handler, extract::{Path, State}, Extension};
use garde::Validate;
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{
    models::{NotificationKind, VacancyApplication},
    notifications::{self, NewNotification},
    res::Created,
    session::Principal,
    validate::clean,
    AppError, AppResult,
};

use super::{
    load_visible,
    projection::{self, ApplyBlock, Viewer},
    repo,
};

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApplyBody {
    #[garde(length(max = 5000))]
    cover_letter: Option<String>,
}

impl ApplyBody {
    /// The cover letter is optional, so an empty body applies without one.
    fn parse(bytes: &[u8]) -> AppResult<Self> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(bytes).map_err(|err| AppError::bad_request(format!("invalid JSON body: {err}")))
    }
}

impl From<ApplyBlock> for AppError {
    fn from(block: ApplyBlock) -> Self {
        match block {
            ApplyBlock::SignedOut => AppError::Unauthorized,
            ApplyBlock::NotStudent => AppError::forbidden("only students can apply to vacancies"),
            ApplyBlock::NotOpen => AppError::bad_request("this vacancy is not accepting applications"),
            ApplyBlock::AlreadyAccepted => AppError::conflict("your application was already accepted"),
        }
    }
}

#[debug_handler]
pub(crate) async fn apply(
    Path(vacancy_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    Extension(principal): Extension<Principal>,
    body: Bytes,
) -> AppResult<Created<VacancyApplication>> {
    let body = ApplyBody::parse(&body)?;
    let vacancy = load_visible(&db_pool, &vacancy_id, &principal).await?;
    body.validate()?;

    let status = repo::application_status(&db_pool, &vacancy.id, &principal.id).await?;
    if let Some(block) = projection::apply_block(&vacancy, Some(Viewer::from(&principal)), status) {
        return Err(block.into());
    }

    let mut tx = db_pool.begin().await?;
    let cover_letter = clean(body.cover_letter);
    if !repo::upsert_application(&mut *tx, &vacancy.id, &principal.id, cover_letter.as_deref()).await? {
        return Err(ApplyBlock::AlreadyAccepted.into());
    }
    let application = repo::application_of(&mut *tx, &vacancy.id, &principal.id)
        .await?
        .ok_or(AppError::NotFound("application"))?;

    notifications::notify(&mut *tx, NewNotification {
        user_id: &vacancy.recruiter_id,
        kind: NotificationKind::VacancyApplication,
        title: "Nova candidatura",
        message: format!("{} se candidatou à vaga \"{}\"", principal.name, vacancy.title),
        link: Some(format!("/vacancies/{}/applications", vacancy.id)),
    }).await?;
    tx.commit().await?;

    tracing::info!(%vacancy_id, applicant = %principal.id, resubmitted = status.is_some(), "application submitted");
    Ok(Created(application))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_is_optional_but_must_be_json_when_sent() {
        assert!(ApplyBody::parse(b"").unwrap().cover_letter.is_none());
        assert!(ApplyBody::parse(b"  \n").unwrap().cover_letter.is_none());
        let body = ApplyBody::parse(r#"{"coverLetter":"Olá"}"#.as_bytes()).unwrap();
        assert_eq!(body.cover_letter.as_deref(), Some("Olá"));
        assert!(matches!(ApplyBody::parse(b"{oops"), Err(AppError::BadRequest(_))));
    }
}
