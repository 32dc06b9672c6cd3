use anyhow::{anyhow, Context};
use bookstore_core::AppConfigTrait;
use bookstore_http::{build_router, init_logging, start_server, AppState, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env().context("Failed to load configuration")?;
    init_logging(&settings.app.logging).map_err(|e| anyhow!("Failed to initialise logging: {}", e))?;

    tracing::info!(
        name = %settings.app.name,
        environment = ?settings.app.environment,
        "Starting bookstore API"
    );
    if !settings.auth.jwt.secret_from_env {
        tracing::warn!("JWT_SECRET is not set; tokens will not survive a restart");
    }

    let pool = bookstore_orm::connect(&settings.app.database).await?;
    bookstore_orm::migrate(&pool).await?;

    let address = settings.app.bind_address();
    let state = AppState::new(pool, settings)?;
    start_server(&address, build_router(state))
        .await
        .with_context(|| format!("Server on {} failed", address))?;

    Ok(())
}
