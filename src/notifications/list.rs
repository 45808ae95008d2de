use axum::{debug_handler, extract::State, Extension};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::{models::Notification, res::{AppQuery, Data}, session::Principal, AppResult};

use super::repo;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListQuery {
    #[serde(default)]
    unread_only: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NotificationList {
    items: Vec<Notification>,
    unread_count: i64,
}

#[debug_handler]
pub(crate) async fn list(
    State(db_pool): State<SqlitePool>,
    Extension(principal): Extension<Principal>,
    AppQuery(ListQuery { unread_only }): AppQuery<ListQuery>,
) -> AppResult<Data<NotificationList>> {
    let items = repo::list_for_user(&db_pool, &principal.id, unread_only).await?;
    let unread_count = repo::unread_count(&db_pool, &principal.id).await?;

    Ok(Data(NotificationList { items, unread_count }))
}
