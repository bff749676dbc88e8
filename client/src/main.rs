use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use staffdesk_client::{
    config::AppConfig, state::auth::AuthStatus, utils::storage::FileStore, StaffDesk,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "staffdesk_client=debug,staffdesk=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        api_base_url = %config.api_base_url,
        request_timeout_secs = config.request_timeout.as_secs(),
        storage_path = %config.storage_path.display(),
        time_zone = %config.time_zone,
        "Loaded configuration from environment/.env"
    );

    let storage = Arc::new(FileStore::new(config.storage_path.clone()));
    let app = StaffDesk::new(config, storage)?;
    let _listener = app.spawn_session_listener();

    let status = app.bootstrap().await;
    tracing::info!(?status, theme = %app.theme.current(), "session bootstrapped");
    if status != AuthStatus::Authenticated {
        tracing::info!("no stored session; sign in to continue");
        return Ok(());
    }

    if let Some(user) = app.session.snapshot().user {
        tracing::info!(user_id = user.id, name = %user.name, admin = user.is_admin(), "signed in");
    }

    match app.attendance().overview().await {
        Ok(overview) => {
            let actions: Vec<&str> = overview.enabled.iter().map(|a| a.as_str()).collect();
            tracing::info!(stage = %overview.stage, ?actions, "today's attendance");
        }
        Err(err) => tracing::warn!(error = %err, "could not load attendance"),
    }

    Ok(())
}
