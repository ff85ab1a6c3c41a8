//! Event-logger process: joins the durable queue group of every configured
//! channel and appends each envelope to the event log.

pub mod config;

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use cellcentre_events::{Connector, EventBus, EventLogger, EventRecordRepository, SubscriptionHandle};

pub use config::Config;

/// Connect, subscribe to every configured channel and return the live
/// subscriptions. Dropping or closing them stops consumption.
pub async fn start(
    config: &Config,
    connector: Arc<dyn Connector>,
    records: Arc<dyn EventRecordRepository>,
) -> anyhow::Result<Vec<SubscriptionHandle>> {
    let bus = Arc::new(EventBus::with_client_id(connector, config.nats_client_id.clone()));
    bus.connect(&config.nats_cluster_id, &config.nats_url)
        .await
        .context("event bus connect")?;

    let logger = EventLogger::new(bus, records, config.nats_client_id.clone());
    let handles = logger
        .listen(&config.subscribes)
        .await
        .context("subscribe")?;
    info!(channels = ?config.subscribes, "event logger started");
    Ok(handles)
}
