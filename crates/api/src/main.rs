use std::sync::Arc;

use anyhow::Context;

use cellcentre_api::{Config, app};
use cellcentre_infra::NatsConnector;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cellcentre_observability::init();

    let config = Config::from_env()?;

    let (services, publish_worker) =
        app::services::build_services(&config, Arc::new(NatsConnector)).await?;
    let app = app::build_app(Arc::new(services));

    let listener = tokio::net::TcpListener::bind(config.listen_address)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_address))?;

    tracing::info!(address = %listener.local_addr()?, "eventstore listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(cellcentre_observability::shutdown_signal())
        .await
        .context("http server")?;

    tracing::info!("draining in-flight event publications");
    publish_worker.shutdown().await;
    Ok(())
}
