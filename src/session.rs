use axum::{extract::{Request, State}, middleware::Next, response::Response};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{models::UserType, AppError, AppResult};

pub const USER_ID: &str = "user_id";

/// The signed-in user, attached to every request on protected routes.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Principal {
    pub id: String,
    pub name: String,
    pub email: String,
    pub user_type: UserType,
    pub curso: Option<String>,
}

impl Principal {
    pub fn is(&self, user_type: UserType) -> bool {
        self.user_type == user_type
    }
}

pub async fn load_principal(db_pool: &SqlitePool, user_id: &str) -> sqlx::Result<Option<Principal>> {
    sqlx::query_as("SELECT id,name,email,user_type,curso FROM users WHERE id=?")
        .bind(user_id)
        .fetch_optional(db_pool)
        .await
}

pub async fn require_principal(
    State(db_pool): State<SqlitePool>,
    session: Session,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let Some(user_id) = session.get::<String>(USER_ID).await? else {
        return Err(AppError::Unauthorized);
    };

    let Some(principal) = load_principal(&db_pool, &user_id).await? else {
        tracing::warn!(%user_id, "session points at a missing user");
        session.flush().await?;
        return Err(AppError::Unauthorized);
    };

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}
