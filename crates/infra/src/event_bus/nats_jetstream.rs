//! NATS JetStream-backed broker (durable, at-least-once delivery).
//!
//! ## Mapping
//!
//! - **Stream**: one per channel, named after the upper-cased channel, with the
//!   channel as its only subject
//! - **Queue group**: a durable push consumer whose `deliver_group` is the group;
//!   all members binding the same durable compete for messages
//! - **Ack**: explicit, sent once the handler future has completed

use std::collections::HashSet;
use std::sync::Arc;

use async_nats::jetstream::{self, consumer, stream};
use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::{Mutex, watch};
use tracing::{debug, error, info, instrument, warn};

use cellcentre_events::{Broker, BrokerError, Connector, MessageHandler, SubscriptionHandle};

/// Stream name backing `channel`.
pub fn stream_name(channel: &str) -> String {
    channel
        .chars()
        .map(|c| match c {
            '.' | '*' | '>' | ' ' => '_',
            other => other.to_ascii_uppercase(),
        })
        .collect()
}

/// Deliver subject shared by every member of one durable.
pub fn deliver_subject(channel: &str, durable: &str) -> String {
    format!("_deliver.{channel}.{durable}")
}

#[derive(Clone)]
pub struct NatsBroker {
    jetstream: jetstream::Context,
    ensured: Arc<Mutex<HashSet<String>>>,
}

impl NatsBroker {
    pub fn new(client: async_nats::Client) -> Self {
        Self {
            jetstream: jetstream::new(client),
            ensured: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Make sure the stream for `channel` exists (idempotent, cached).
    async fn ensure_stream(&self, channel: &str) -> Result<stream::Stream, String> {
        let name = stream_name(channel);
        let stream = self
            .jetstream
            .get_or_create_stream(stream::Config {
                name: name.clone(),
                subjects: vec![channel.to_string()],
                ..Default::default()
            })
            .await
            .map_err(|e| e.to_string())?;

        let mut ensured = self.ensured.lock().await;
        if ensured.insert(channel.to_string()) {
            info!(channel, stream = %name, "jetstream stream ready");
        }
        Ok(stream)
    }

    async fn stream_known(&self, channel: &str) -> bool {
        self.ensured.lock().await.contains(channel)
    }
}

#[async_trait]
impl Broker for NatsBroker {
    #[instrument(skip(self, payload), fields(bytes = payload.len()), err)]
    async fn publish(&self, channel: &str, payload: Vec<u8>) -> Result<(), BrokerError> {
        if !self.stream_known(channel).await {
            self.ensure_stream(channel)
                .await
                .map_err(BrokerError::Publish)?;
        }
        let ack = self
            .jetstream
            .publish(channel.to_string(), payload.into())
            .await
            .map_err(|e| BrokerError::Publish(e.to_string()))?;
        ack.await.map_err(|e| BrokerError::Publish(e.to_string()))?;
        Ok(())
    }

    #[instrument(skip(self, handler), err)]
    async fn queue_subscribe(
        &self,
        channel: &str,
        group: &str,
        durable: &str,
        handler: MessageHandler,
    ) -> Result<SubscriptionHandle, BrokerError> {
        let stream = self
            .ensure_stream(channel)
            .await
            .map_err(BrokerError::Subscribe)?;

        let push_consumer: consumer::PushConsumer = stream
            .get_or_create_consumer(
                durable,
                consumer::push::Config {
                    durable_name: Some(durable.to_string()),
                    deliver_subject: deliver_subject(channel, durable),
                    deliver_group: Some(group.to_string()),
                    filter_subject: channel.to_string(),
                    ack_policy: consumer::AckPolicy::Explicit,
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| BrokerError::Subscribe(e.to_string()))?;

        let mut messages = Box::pin(
            push_consumer
                .messages()
                .await
                .map_err(|e| BrokerError::Subscribe(e.to_string()))?,
        );

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let task_channel = channel.to_string();
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => break,
                    next = messages.next() => match next {
                        Some(Ok(message)) => {
                            handler(message.payload.to_vec()).await;
                            if let Err(e) = message.ack().await {
                                warn!(channel = %task_channel, error = %e, "ack failed; message will be redelivered");
                            }
                        }
                        Some(Err(e)) => {
                            error!(channel = %task_channel, error = %e, "jetstream delivery error");
                        }
                        None => {
                            debug!(channel = %task_channel, "jetstream message stream ended");
                            break;
                        }
                    },
                }
            }
        });

        Ok(SubscriptionHandle::new(channel, shutdown_tx, task))
    }
}

/// Opens NATS connections named `<cluster-id>-<client-id>`.
#[derive(Debug, Clone, Default)]
pub struct NatsConnector;

#[async_trait]
impl Connector for NatsConnector {
    async fn connect(
        &self,
        cluster_id: &str,
        client_id: &str,
        endpoint: &str,
    ) -> Result<Arc<dyn Broker>, BrokerError> {
        let client = async_nats::ConnectOptions::new()
            .name(format!("{cluster_id}-{client_id}"))
            .connect(endpoint)
            .await
            .map_err(|e| BrokerError::Connect(e.to_string()))?;
        info!(endpoint, client_id, "connected to nats");
        Ok(Arc::new(NatsBroker::new(client)))
    }
}
