//! Transport abstraction for durable pub/sub brokers.
//!
//! The bus only needs two things from a broker: publish bytes to a channel,
//! and join a named durable queue group on a channel. Delivery is
//! at-least-once; a message counts as acknowledged once its handler future
//! completes.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("broker connection failed: {0}")]
    Connect(String),

    #[error("broker publish failed: {0}")]
    Publish(String),

    #[error("broker subscribe failed: {0}")]
    Subscribe(String),
}

/// Callback invoked once per delivered message with its raw payload.
pub type MessageHandler = Arc<dyn Fn(Vec<u8>) -> BoxFuture<'static, ()> + Send + Sync>;

/// Wrap an async closure as a [`MessageHandler`].
pub fn handler_fn<F, Fut>(f: F) -> MessageHandler
where
    F: Fn(Vec<u8>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |payload: Vec<u8>| -> BoxFuture<'static, ()> { Box::pin(f(payload)) })
}

/// A live broker connection.
#[async_trait]
pub trait Broker: Send + Sync {
    async fn publish(&self, channel: &str, payload: Vec<u8>) -> Result<(), BrokerError>;

    /// Join `group` on `channel` under the durable name `durable`.
    ///
    /// Members of one group compete for messages; a durable member that
    /// resubscribes receives what was published while it was away.
    async fn queue_subscribe(
        &self,
        channel: &str,
        group: &str,
        durable: &str,
        handler: MessageHandler,
    ) -> Result<SubscriptionHandle, BrokerError>;
}

/// Opens broker connections.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        cluster_id: &str,
        client_id: &str,
        endpoint: &str,
    ) -> Result<Arc<dyn Broker>, BrokerError>;
}

/// Running subscription. Dropping the handle stops delivery after the
/// in-flight message; [`SubscriptionHandle::close`] also waits for it.
#[derive(Debug)]
pub struct SubscriptionHandle {
    channel: String,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SubscriptionHandle {
    pub fn new(channel: impl Into<String>, shutdown: watch::Sender<bool>, task: JoinHandle<()>) -> Self {
        Self {
            channel: channel.into(),
            shutdown,
            task,
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Stop taking new messages and wait for the in-flight handler to finish.
    pub async fn close(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            tracing::warn!(channel = %self.channel, error = %e, "subscription task ended abnormally");
        }
    }
}
