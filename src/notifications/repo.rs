use sqlx::{QueryBuilder, Sqlite, SqliteExecutor, SqlitePool};

use crate::{db, models::{Notification, NotificationKind}, AppResult};

const LIST_LIMIT: i64 = 100;

pub struct NewNotification<'a> {
    pub user_id: &'a str,
    pub kind: NotificationKind,
    pub title: &'a str,
    pub message: String,
    pub link: Option<String>,
}

pub async fn notify<'e>(db: impl SqliteExecutor<'e>, n: NewNotification<'_>) -> AppResult<()> {
    sqlx::query("INSERT INTO notifications (id,user_id,kind,title,message,link,read,created_at) VALUES (?,?,?,?,?,?,0,?)")
        .bind(db::new_id())
        .bind(n.user_id)
        .bind(n.kind)
        .bind(n.title)
        .bind(n.message)
        .bind(n.link)
        .bind(db::now()?)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn list_for_user(db_pool: &SqlitePool, user_id: &str, unread_only: bool) -> sqlx::Result<Vec<Notification>> {
    sqlx::query_as(
        "SELECT id,kind,title,message,link,read,created_at FROM notifications
         WHERE user_id=? AND (?=0 OR read=0)
         ORDER BY created_at DESC, id DESC LIMIT ?",
    )
        .bind(user_id)
        .bind(unread_only)
        .bind(LIST_LIMIT)
        .fetch_all(db_pool)
        .await
}

pub async fn unread_count(db_pool: &SqlitePool, user_id: &str) -> sqlx::Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM notifications WHERE user_id=? AND read=0")
        .bind(user_id)
        .fetch_one(db_pool)
        .await?;
    Ok(count)
}

pub async fn mark_all_read(db_pool: &SqlitePool, user_id: &str) -> sqlx::Result<u64> {
    let res = sqlx::query("UPDATE notifications SET read=1 WHERE user_id=? AND read=0")
        .bind(user_id)
        .execute(db_pool)
        .await?;
    Ok(res.rows_affected())
}

/// Ids that belong to someone else are ignored.
pub async fn mark_read(db_pool: &SqlitePool, user_id: &str, ids: &[String]) -> sqlx::Result<u64> {
    if ids.is_empty() {
        return Ok(0);
    }

    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE notifications SET read=1 WHERE read=0 AND user_id=");
    qb.push_bind(user_id);
    qb.push(" AND id IN (");
    let mut separated = qb.separated(",");
    for id in ids {
        separated.push_bind(id);
    }
    separated.push_unseparated(")");

    let res = qb.build().execute(db_pool).await?;
    Ok(res.rows_affected())
}
