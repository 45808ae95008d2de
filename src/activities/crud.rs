use axum::{debug_handler, extract::{Path, State}, Extension};
use garde::Validate;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::{
    db,
    models::{Activity, ActivityLink, ActivityStatus, NotificationKind, Observation, Participant},
    notifications::{self, NewNotification},
    res::{nullable, AppJson, Created, Data},
    session::Principal,
    validate::{self, clean, parse_date},
    AppResult, FieldErrors,
};

use super::{load_for_leader, load_for_participant, repo::{self, ActivitySummary, NewLink}};

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LinkInput {
    #[garde(length(max = 120))]
    title: Option<String>,
    #[garde(length(max = 2048), custom(validate::http_url))]
    url: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewActivityBody {
    #[garde(length(min = 3, max = 120), custom(validate::not_blank))]
    title: String,
    #[garde(length(max = 5000))]
    description: Option<String>,
    #[garde(custom(validate::optional_date))]
    start_date: Option<String>,
    #[garde(custom(validate::optional_date))]
    end_date: Option<String>,
    #[garde(length(max = 20), dive)]
    links: Option<Vec<LinkInput>>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ActivityPatch {
    #[garde(length(min = 3, max = 120), custom(validate::optional_not_blank))]
    title: Option<String>,
    #[garde(length(max = 5000))]
    description: Option<String>,
    #[garde(skip)]
    status: Option<ActivityStatus>,
    #[serde(default, deserialize_with = "nullable")]
    #[garde(custom(validate::clearable_date))]
    start_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[garde(custom(validate::clearable_date))]
    end_date: Option<Option<String>>,
    #[garde(length(max = 20), dive)]
    links: Option<Vec<LinkInput>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ActivityDetail {
    #[serde(flatten)]
    activity: Activity,
    is_leader: bool,
    participants: Vec<Participant>,
    links: Vec<ActivityLink>,
    observations: Vec<Observation>,
}

fn to_links(links: Vec<LinkInput>) -> Vec<NewLink> {
    links
        .into_iter()
        .map(|l| NewLink { title: clean(l.title), url: l.url.trim().to_owned() })
        .collect()
}

fn check_dates(start_date: Option<&str>, end_date: Option<&str>) -> AppResult<()> {
    let mut errors = FieldErrors::default();
    if let (Some(start), Some(end)) = (start_date.and_then(parse_date), end_date.and_then(parse_date)) {
        if end < start {
            errors.add("endDate", "must not be before startDate");
        }
    }
    errors.into_result()
}

impl ActivityPatch {
    /// Overlays the patch on `activity`, returning the replacement link set if one was sent.
    fn apply(self, activity: &mut Activity) -> Option<Vec<NewLink>> {
        if let Some(title) = clean(self.title) {
            activity.title = title;
        }
        if let Some(description) = self.description {
            activity.description = clean(Some(description));
        }
        if let Some(status) = self.status {
            activity.status = status;
        }
        if let Some(start_date) = self.start_date {
            activity.start_date = clean(start_date);
        }
        if let Some(end_date) = self.end_date {
            activity.end_date = clean(end_date);
        }
        self.links.map(to_links)
    }
}

async fn detail_of(db_pool: &SqlitePool, activity: Activity, principal: &Principal) -> AppResult<ActivityDetail> {
    let participants = repo::list_participants(db_pool, &activity.id).await?;
    let links = repo::list_links(db_pool, &activity.id).await?;
    let observations = repo::list_observations(db_pool, &activity.id).await?;

    Ok(ActivityDetail {
        is_leader: activity.leader_id == principal.id,
        activity,
        participants,
        links,
        observations,
    })
}

#[debug_handler]
pub(crate) async fn list(
    State(db_pool): State<SqlitePool>,
    Extension(principal): Extension<Principal>,
) -> AppResult<Data<Vec<ActivitySummary>>> {
    Ok(Data(repo::list_for_user(&db_pool, &principal.id).await?))
}

#[debug_handler]
pub(crate) async fn create(
    State(db_pool): State<SqlitePool>,
    Extension(principal): Extension<Principal>,
    AppJson(body): AppJson<NewActivityBody>,
) -> AppResult<Created<ActivityDetail>> {
    body.validate()?;
    check_dates(body.start_date.as_deref(), body.end_date.as_deref())?;

    let now = db::now()?;
    let activity = Activity {
        id: db::new_id(),
        title: body.title.trim().to_owned(),
        description: clean(body.description),
        status: ActivityStatus::Pending,
        start_date: clean(body.start_date),
        end_date: clean(body.end_date),
        created_by: principal.id.clone(),
        leader_id: principal.id.clone(),
        created_at: now.clone(),
        updated_at: now,
    };
    let links = to_links(body.links.unwrap_or_default());

    let mut tx = db_pool.begin().await?;
    repo::insert_activity(&mut tx, &activity).await?;
    repo::add_participant(&mut *tx, &activity.id, &principal.id, Some("leader")).await?;
    repo::replace_links(&mut tx, &activity.id, &links).await?;
    tx.commit().await?;

    tracing::info!(activity_id = %activity.id, leader = %principal.id, "activity created");
    Ok(Created(detail_of(&db_pool, activity, &principal).await?))
}

#[debug_handler]
pub(crate) async fn detail(
    Path(activity_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    Extension(principal): Extension<Principal>,
) -> AppResult<Data<ActivityDetail>> {
    let activity = load_for_participant(&db_pool, &activity_id, &principal).await?;
    Ok(Data(detail_of(&db_pool, activity, &principal).await?))
}

#[debug_handler]
pub(crate) async fn update(
    Path(activity_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    Extension(principal): Extension<Principal>,
    AppJson(patch): AppJson<ActivityPatch>,
) -> AppResult<Data<ActivityDetail>> {
    let mut activity = load_for_leader(&db_pool, &activity_id, &principal).await?;
    patch.validate()?;

    let links = patch.apply(&mut activity);
    check_dates(activity.start_date.as_deref(), activity.end_date.as_deref())?;
    activity.updated_at = db::now()?;

    repo::update_with_links(&db_pool, &activity, links.as_deref()).await?;

    for user_id in repo::participant_ids(&db_pool, &activity.id).await? {
        if user_id == principal.id {
            continue;
        }
        notifications::notify(&db_pool, NewNotification {
            user_id: &user_id,
            kind: NotificationKind::ActivityUpdate,
            title: "Atividade atualizada",
            message: format!("{} atualizou a atividade \"{}\"", principal.name, activity.title),
            link: Some(format!("/activities/{}", activity.id)),
        }).await?;
    }

    tracing::info!(%activity_id, by = %principal.id, "activity updated");
    Ok(Data(detail_of(&db_pool, activity, &principal).await?))
}

#[derive(Serialize)]
pub(crate) struct Deleted {
    id: String,
}

#[debug_handler]
pub(crate) async fn remove(
    Path(activity_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    Extension(principal): Extension<Principal>,
) -> AppResult<Data<Deleted>> {
    let activity = load_for_leader(&db_pool, &activity_id, &principal).await?;

    let mut tx = db_pool.begin().await?;
    let participants = repo::participant_ids(&mut *tx, &activity.id).await?;
    repo::delete_activity(&mut *tx, &activity.id).await?;
    for user_id in participants.iter().filter(|id| **id != principal.id) {
        notifications::notify(&mut *tx, NewNotification {
            user_id,
            kind: NotificationKind::ActivityUpdate,
            title: "Atividade removida",
            message: format!("A atividade \"{}\" foi removida por {}", activity.title, principal.name),
            link: None,
        }).await?;
    }
    tx.commit().await?;

    tracing::info!(%activity_id, by = %principal.id, "activity deleted");
    Ok(Data(Deleted { id: activity.id }))
}
