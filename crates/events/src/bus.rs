//! Durable-publish event bus.
//!
//! One instance owns exactly one broker connection, identified by a client id
//! fixed at construction. Access to the connection slot is serialized; the
//! publishes themselves run concurrently on the shared connection.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::broker::{Broker, BrokerError, Connector, MessageHandler, SubscriptionHandle};
use crate::{EventEnvelope, codec};

#[derive(Debug, Error)]
pub enum BusError {
    #[error("event bus is not connected")]
    NotConnected,

    #[error("event bus is already connected")]
    AlreadyConnected,

    #[error("event bus connection failed: {0}")]
    Connect(#[source] BrokerError),

    #[error("event publish failed: {0}")]
    PublishFailure(String),

    #[error("event subscription failed: {0}")]
    Subscribe(#[source] BrokerError),
}

pub struct EventBus {
    client_id: String,
    connector: Arc<dyn Connector>,
    connection: Mutex<Option<Arc<dyn Broker>>>,
    publish_timeout: Duration,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("client_id", &self.client_id)
            .field("publish_timeout", &self.publish_timeout)
            .finish_non_exhaustive()
    }
}

impl EventBus {
    pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);

    /// New bus with a generated, process-unique client id.
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self::with_client_id(connector, format!("eventstore-{}", Uuid::new_v4().simple()))
    }

    pub fn with_client_id(connector: Arc<dyn Connector>, client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            connector,
            connection: Mutex::new(None),
            publish_timeout: Self::DEFAULT_PUBLISH_TIMEOUT,
        }
    }

    pub fn with_publish_timeout(mut self, timeout: Duration) -> Self {
        self.publish_timeout = timeout;
        self
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub async fn is_connected(&self) -> bool {
        self.connection.lock().await.is_some()
    }

    /// Open the single connection of this instance.
    #[instrument(skip(self), fields(client_id = %self.client_id))]
    pub async fn connect(&self, cluster_id: &str, endpoint: &str) -> Result<(), BusError> {
        let mut slot = self.connection.lock().await;
        if slot.is_some() {
            return Err(BusError::AlreadyConnected);
        }
        let broker = self
            .connector
            .connect(cluster_id, &self.client_id, endpoint)
            .await
            .map_err(BusError::Connect)?;
        *slot = Some(broker);
        info!("event bus connected");
        Ok(())
    }

    async fn broker(&self) -> Result<Arc<dyn Broker>, BusError> {
        self.connection
            .lock()
            .await
            .clone()
            .ok_or(BusError::NotConnected)
    }

    /// Serialize `envelope` and publish it on its channel.
    pub async fn publish(&self, envelope: &EventEnvelope) -> Result<(), BusError> {
        let broker = self.broker().await?;
        let payload =
            codec::encode(envelope).map_err(|e| BusError::PublishFailure(e.to_string()))?;

        match tokio::time::timeout(self.publish_timeout, broker.publish(envelope.channel(), payload))
            .await
        {
            Ok(Ok(())) => {
                debug!(
                    event_id = %envelope.event_id(),
                    channel = envelope.channel(),
                    event_type = %envelope.event_type(),
                    "event published"
                );
                Ok(())
            }
            Ok(Err(e)) => Err(BusError::PublishFailure(e.to_string())),
            Err(_) => Err(BusError::PublishFailure(format!(
                "timed out after {:?}",
                self.publish_timeout
            ))),
        }
    }

    pub async fn queue_subscribe(
        &self,
        channel: &str,
        group: &str,
        durable: &str,
        handler: MessageHandler,
    ) -> Result<SubscriptionHandle, BusError> {
        let broker = self.broker().await?;
        broker
            .queue_subscribe(channel, group, durable, handler)
            .await
            .map_err(BusError::Subscribe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EventFactory, InMemoryConnector, handler_fn};
    use async_trait::async_trait;
    use cellcentre_auth::IdentityClaims;
    use cellcentre_employees::EmployeeFilter;

    fn envelope() -> EventEnvelope {
        EventFactory::employees()
            .delete_entity(&IdentityClaims::default(), &EmployeeFilter::by_email("a@page.com"))
            .unwrap()
    }

    #[test]
    fn client_ids_are_unique_per_instance() {
        let connector = Arc::new(InMemoryConnector::default());
        let a = EventBus::new(connector.clone());
        let b = EventBus::new(connector);
        assert_ne!(a.client_id(), b.client_id());
    }

    #[tokio::test]
    async fn publish_before_connect_is_not_connected() {
        let bus = EventBus::new(Arc::new(InMemoryConnector::default()));
        assert!(matches!(bus.publish(&envelope()).await, Err(BusError::NotConnected)));
    }

    #[tokio::test]
    async fn second_connect_is_rejected() {
        let bus = EventBus::new(Arc::new(InMemoryConnector::default()));
        bus.connect("cluster", "mem://").await.unwrap();
        assert!(matches!(
            bus.connect("cluster", "mem://").await,
            Err(BusError::AlreadyConnected)
        ));
        assert!(bus.is_connected().await);
    }

    #[tokio::test]
    async fn published_bytes_reach_subscribers() {
        let bus = EventBus::new(Arc::new(InMemoryConnector::default()));
        bus.connect("cluster", "mem://").await.unwrap();

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let _sub = bus
            .queue_subscribe(
                "employees",
                "g",
                "d",
                handler_fn(move |payload| {
                    let tx = tx.clone();
                    async move {
                        let _ = tx.send(payload);
                    }
                }),
            )
            .await
            .unwrap();

        let env = envelope();
        bus.publish(&env).await.unwrap();
        let bytes = rx.recv().await.unwrap();
        assert_eq!(codec::decode(&bytes).unwrap(), env);
    }

    struct Stalled;

    #[async_trait]
    impl Broker for Stalled {
        async fn publish(&self, _: &str, _: Vec<u8>) -> Result<(), BrokerError> {
            futures::future::pending::<()>().await;
            Ok(())
        }

        async fn queue_subscribe(
            &self,
            _: &str,
            _: &str,
            _: &str,
            _: MessageHandler,
        ) -> Result<SubscriptionHandle, BrokerError> {
            Err(BrokerError::Subscribe("unsupported".into()))
        }
    }

    struct StalledConnector;

    #[async_trait]
    impl Connector for StalledConnector {
        async fn connect(&self, _: &str, _: &str, _: &str) -> Result<Arc<dyn Broker>, BrokerError> {
            Ok(Arc::new(Stalled))
        }
    }

    #[tokio::test]
    async fn stalled_publish_times_out() {
        let bus = EventBus::new(Arc::new(StalledConnector))
            .with_publish_timeout(Duration::from_millis(20));
        bus.connect("cluster", "nats://unused").await.unwrap();
        assert!(matches!(
            bus.publish(&envelope()).await,
            Err(BusError::PublishFailure(_))
        ));
    }
}
