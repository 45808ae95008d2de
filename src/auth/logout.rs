use axum::debug_handler;
use serde_json::{json, Value};
use tower_sessions::Session;

use crate::{res::Data, AppResult};

#[debug_handler]
pub(crate) async fn logout(session: Session) -> AppResult<Data<Value>> {
    session.flush().await?;
    Ok(Data(json!({ "signedOut": true })))
}
