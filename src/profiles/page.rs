use axum::{debug_handler, extract::{Path, State}};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::{
    medals,
    models::{BadgeAward, Experience, UserType},
    res::Data,
    AppError, AppResult,
};

use super::repo;

/// What any signed-in user may see about another user.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PublicProfile {
    id: String,
    name: String,
    user_type: UserType,
    curso: Option<String>,
    university: Option<String>,
    company: Option<String>,
    state: Option<String>,
    city: Option<String>,
    bio: Option<String>,
    image_url: Option<String>,
    gold_medals: i64,
    silver_medals: i64,
    bronze_medals: i64,
    experiences: Vec<Experience>,
    badges_received: Vec<BadgeAward>,
}

#[debug_handler]
pub(crate) async fn profile(
    Path(user_id): Path<String>,
    State(db_pool): State<SqlitePool>,
) -> AppResult<Data<PublicProfile>> {
    let Some(user) = repo::load_user(&db_pool, &user_id).await? else {
        return Err(AppError::NotFound("user"));
    };
    let experiences = repo::list_experiences(&db_pool, &user_id).await?;
    let badges_received = medals::repo::list_awards(&db_pool, &user_id).await?;

    Ok(Data(PublicProfile {
        id: user.id,
        name: user.name,
        user_type: user.user_type,
        curso: user.curso,
        university: user.university,
        company: user.company,
        state: user.state,
        city: user.city,
        bio: user.bio,
        image_url: user.image_url,
        gold_medals: user.gold_medals,
        silver_medals: user.silver_medals,
        bronze_medals: user.bronze_medals,
        experiences,
        badges_received,
    }))
}
