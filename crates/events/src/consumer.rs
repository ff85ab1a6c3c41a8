//! Event-log consumer: durable queue-group member that persists every
//! envelope it receives.

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::broker::{SubscriptionHandle, handler_fn};
use crate::{BusError, CodecError, EventBus, EventRecordRepository, RecordError, StoredEventRecord, codec};

/// Queue group shared by all event-logger instances on `channel`.
pub fn queue_group(channel: &str) -> String {
    format!("{channel}-eventlogger-group")
}

/// Durable name of the consumer identified by `client_id`.
pub fn durable_name(client_id: &str) -> String {
    format!("eventlogger-{client_id}-durable")
}

#[derive(Debug, Error)]
pub enum ConsumeError {
    #[error(transparent)]
    Decode(#[from] CodecError),

    #[error(transparent)]
    Persist(#[from] RecordError),
}

pub struct EventLogger {
    bus: Arc<EventBus>,
    records: Arc<dyn EventRecordRepository>,
    client_id: String,
}

impl EventLogger {
    pub fn new(
        bus: Arc<EventBus>,
        records: Arc<dyn EventRecordRepository>,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            bus,
            records,
            client_id: client_id.into(),
        }
    }

    /// Subscribe once per channel. Each channel gets its own subscription;
    /// there is no ordering across channels.
    pub async fn listen(&self, channels: &[String]) -> Result<Vec<SubscriptionHandle>, BusError> {
        let durable = durable_name(&self.client_id);
        let mut handles = Vec::with_capacity(channels.len());
        for channel in channels {
            let group = queue_group(channel);
            let records = self.records.clone();
            let log_channel = channel.clone();
            let handler = handler_fn(move |payload| {
                let records = records.clone();
                let channel = log_channel.clone();
                async move {
                    if let Err(e) = handle_message(records.as_ref(), &payload).await {
                        match e {
                            ConsumeError::Decode(_) => {
                                warn!(channel = %channel, error = %e, "dropping undecodable event")
                            }
                            ConsumeError::Persist(_) => {
                                error!(channel = %channel, error = %e, "failed to persist event")
                            }
                        }
                    }
                }
            });
            let handle = self
                .bus
                .queue_subscribe(channel, &group, &durable, handler)
                .await?;
            info!(channel = %channel, group = %group, durable = %durable, "listening");
            handles.push(handle);
        }
        Ok(handles)
    }
}

/// Decode one wire payload and append it to the event log.
pub async fn handle_message(
    records: &dyn EventRecordRepository,
    payload: &[u8],
) -> Result<StoredEventRecord, ConsumeError> {
    let envelope = codec::decode(payload)?;
    let record = StoredEventRecord::from(envelope);
    records.append(record.clone()).await?;
    Ok(record)
}
