use serde::Serialize;
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};

use crate::{db, models::{Experience, User}, AppResult};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(flatten)]
    pub user: User,
    pub experiences: Vec<Experience>,
}

pub struct NewExperience {
    pub title: String,
    pub organization: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub description: Option<String>,
}

pub async fn load_user<'e>(db: impl SqliteExecutor<'e>, user_id: &str) -> sqlx::Result<Option<User>> {
    sqlx::query_as("SELECT * FROM users WHERE id=?")
        .bind(user_id)
        .fetch_optional(db)
        .await
}

pub async fn list_experiences<'e>(db: impl SqliteExecutor<'e>, user_id: &str) -> sqlx::Result<Vec<Experience>> {
    sqlx::query_as(
        "SELECT id,title,organization,start_date,end_date,description FROM experiences
         WHERE user_id=? ORDER BY position",
    )
        .bind(user_id)
        .fetch_all(db)
        .await
}

pub async fn load_profile(db_pool: &SqlitePool, user_id: &str) -> sqlx::Result<Option<Profile>> {
    let Some(user) = load_user(db_pool, user_id).await? else {
        return Ok(None);
    };
    let experiences = list_experiences(db_pool, user_id).await?;
    Ok(Some(Profile { user, experiences }))
}

/// Writes every editable column of `user`.
pub async fn save_user(conn: &mut SqliteConnection, user: &User) -> AppResult<()> {
    sqlx::query(
        "UPDATE users SET name=?,phone=?,cpf=?,curso=?,university=?,cnpj=?,company=?,cep=?,state=?,city=?,bio=?,updated_at=?
         WHERE id=?",
    )
        .bind(&user.name)
        .bind(&user.phone)
        .bind(&user.cpf)
        .bind(&user.curso)
        .bind(&user.university)
        .bind(&user.cnpj)
        .bind(&user.company)
        .bind(&user.cep)
        .bind(&user.state)
        .bind(&user.city)
        .bind(&user.bio)
        .bind(db::now()?)
        .bind(&user.id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn replace_experiences(conn: &mut SqliteConnection, user_id: &str, experiences: Vec<NewExperience>) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM experiences WHERE user_id=?")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    for (position, e) in experiences.into_iter().enumerate() {
        sqlx::query(
            "INSERT INTO experiences (id,user_id,title,organization,start_date,end_date,description,position)
             VALUES (?,?,?,?,?,?,?,?)",
        )
            .bind(db::new_id())
            .bind(user_id)
            .bind(e.title)
            .bind(e.organization)
            .bind(e.start_date)
            .bind(e.end_date)
            .bind(e.description)
            .bind(position as i64)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}
