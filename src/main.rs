use std::sync::Arc;

use anyhow::Context;
use needuk::{app, db, AppState, Config};
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("needuk=info,tower_http=info")))
        .init();

    let config = Config::from_env()?;

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(config.session_secure)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(config.session_minutes)));

    let db_pool = db::connect(&config)
        .await
        .with_context(|| format!("connecting to {}", config.database_url))?;

    if config.dev_login {
        tracing::warn!("NEEDUK_DEV_LOGIN is on: POST /api/session signs in by email alone");
    }

    let bind = config.bind;
    let app_state = AppState {
        db_pool,
        config: Arc::new(config),
    };

    let app = app(app_state).layer(session_layer);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
