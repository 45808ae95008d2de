use axum::{debug_handler, extract::State};
use serde::Deserialize;
use tower_sessions::Session;

use crate::{
    profiles::{self, Profile},
    res::{AppJson, Data},
    session::USER_ID,
    AppError, AppResult, AppState,
};

#[derive(Deserialize)]
pub(crate) struct LoginBody {
    email: String,
}

/// Signs in by email alone. Only served when `NEEDUK_DEV_LOGIN` is on.
#[debug_handler(state = AppState)]
pub(crate) async fn login(
    State(state): State<AppState>,
    session: Session,
    AppJson(LoginBody { email }): AppJson<LoginBody>,
) -> AppResult<Data<Profile>> {
    if !state.config.dev_login {
        return Err(AppError::NotFound("route"));
    }

    let Some((user_id,)): Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE email=?")
        .bind(email.trim())
        .fetch_optional(&state.db_pool)
        .await?
    else {
        return Err(AppError::NotFound("user"));
    };

    session.cycle_id().await?;
    session.insert(USER_ID, &user_id).await?;
    tracing::info!(%user_id, "signed in");

    let profile = profiles::repo::load_profile(&state.db_pool, &user_id)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    Ok(Data(profile))
}
