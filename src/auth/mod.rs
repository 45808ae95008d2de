mod login;
mod logout;
mod register;

use axum::{routing::post, Router};
use sqlx::SqliteExecutor;

use crate::{db, models::UserType, AppResult, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register::register))
        .route("/session", post(login::login).delete(logout::logout))
}

pub(crate) struct NewUser {
    pub name: String,
    pub email: String,
    pub user_type: UserType,
    pub phone: Option<String>,
    pub cpf: Option<String>,
    pub curso: Option<String>,
    pub university: Option<String>,
    pub cnpj: Option<String>,
    pub company: Option<String>,
    pub cep: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
}

pub(crate) async fn create_user<'e>(db: impl SqliteExecutor<'e>, user: NewUser) -> AppResult<String> {
    let id = db::new_id();
    let now = db::now()?;

    tracing::info!(%id, user_type = ?user.user_type, "adding user");
    sqlx::query(
        "INSERT INTO users (id,name,email,user_type,phone,cpf,curso,university,cnpj,company,cep,state,city,created_at,updated_at)
         VALUES (?,?,?,?,?,?,?,?,?,?,?,?,?,?,?)",
    )
        .bind(&id)
        .bind(user.name)
        .bind(user.email)
        .bind(user.user_type)
        .bind(user.phone)
        .bind(user.cpf)
        .bind(user.curso)
        .bind(user.university)
        .bind(user.cnpj)
        .bind(user.company)
        .bind(user.cep)
        .bind(user.state)
        .bind(user.city)
        .bind(&now)
        .bind(&now)
        .execute(db)
        .await?;

    Ok(id)
}
