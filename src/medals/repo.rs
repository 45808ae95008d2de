use sqlx::{SqliteConnection, SqliteExecutor};

use crate::{db, models::{BadgeAward, MedalType}, AppResult};

pub struct NewAward<'a> {
    pub user_id: &'a str,
    pub awarded_by: &'a str,
    pub activity_id: Option<&'a str>,
    pub medal_type: MedalType,
    pub reason: Option<String>,
}

pub async fn list_awards<'e>(db: impl SqliteExecutor<'e>, user_id: &str) -> sqlx::Result<Vec<BadgeAward>> {
    sqlx::query_as(
        "SELECT b.id,b.user_id,b.awarded_by,g.name AS awarded_by_name,b.activity_id,a.title AS activity_title,
                b.medal_type,b.reason,b.created_at
         FROM badge_awards b
         JOIN users g ON g.id = b.awarded_by
         LEFT JOIN activities a ON a.id = b.activity_id
         WHERE b.user_id=?
         ORDER BY b.created_at DESC, b.id DESC",
    )
        .bind(user_id)
        .fetch_all(db)
        .await
}

/// Inserts the award row and bumps the matching counter on the student.
pub async fn insert_award(conn: &mut SqliteConnection, award: NewAward<'_>) -> AppResult<String> {
    let id = db::new_id();
    sqlx::query(
        "INSERT INTO badge_awards (id,user_id,awarded_by,activity_id,medal_type,reason,created_at)
         VALUES (?,?,?,?,?,?,?)",
    )
        .bind(&id)
        .bind(award.user_id)
        .bind(award.awarded_by)
        .bind(award.activity_id)
        .bind(award.medal_type)
        .bind(&award.reason)
        .bind(db::now()?)
        .execute(&mut *conn)
        .await?;

    let column = award.medal_type.counter_column();
    sqlx::query(&format!("UPDATE users SET {column} = {column} + 1 WHERE id=?"))
        .bind(award.user_id)
        .execute(&mut *conn)
        .await?;

    Ok(id)
}
