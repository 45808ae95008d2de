use axum::{debug_handler, extract::State, Extension};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::{res::{AppJson, Data}, session::Principal, AppError, AppResult};

use super::repo;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MarkReadBody {
    ids: Option<Vec<String>>,
    #[serde(default)]
    all: bool,
}

#[derive(Serialize)]
pub(crate) struct Updated {
    updated: u64,
}

#[debug_handler]
pub(crate) async fn mark_read(
    State(db_pool): State<SqlitePool>,
    Extension(principal): Extension<Principal>,
    AppJson(MarkReadBody { ids, all }): AppJson<MarkReadBody>,
) -> AppResult<Data<Updated>> {
    let updated = match (all, ids) {
        (true, _) => repo::mark_all_read(&db_pool, &principal.id).await?,
        (false, Some(ids)) => repo::mark_read(&db_pool, &principal.id, &ids).await?,
        (false, None) => return Err(AppError::bad_request("expected ids or all")),
    };

    tracing::debug!(user_id = %principal.id, updated, "notifications marked read");
    Ok(Data(Updated { updated }))
}
