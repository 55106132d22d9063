use std::sync::Arc;

use anyhow::Context;

use workdesk_api::app::{build_app, services::AppServices};
use workdesk_api::config::ApiConfig;
use workdesk_auth::AuthConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    workdesk_observability::init();

    let auth_config = AuthConfig::from_env().context("loading auth configuration")?;
    let api_config = ApiConfig::from_env().context("loading api configuration")?;

    let services = AppServices::new(&auth_config).context("initializing services")?;
    if let Some(admin) = &api_config.bootstrap_admin {
        let user_id = services
            .bootstrap_admin(&admin.username, &admin.password)
            .await
            .context("seeding bootstrap admin")?;
        tracing::info!(%user_id, username = %admin.username, "bootstrap admin created");
    } else {
        tracing::warn!("no bootstrap admin configured; nobody can log in until one exists");
    }

    let app = build_app(Arc::new(services)).context("building router")?;

    let listener = tokio::net::TcpListener::bind(api_config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", api_config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
