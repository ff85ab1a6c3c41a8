use std::sync::Arc;

use anyhow::Context;

use cellcentre_eventlogger::{Config, start};
use cellcentre_infra::{NatsConnector, PostgresEventLog};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cellcentre_observability::init();

    let config = Config::from_env()?;

    let log = PostgresEventLog::connect(&config.database_url)
        .await
        .context("event log database")?;
    log.ensure_schema().await.context("event log schema")?;

    let subscriptions = start(&config, Arc::new(NatsConnector), Arc::new(log)).await?;

    cellcentre_observability::shutdown_signal().await;

    tracing::info!("stopping subscriptions");
    for subscription in subscriptions {
        subscription.close().await;
    }
    Ok(())
}
