//! In-memory broker for tests/dev.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use crate::broker::{Broker, BrokerError, Connector, MessageHandler, SubscriptionHandle};

#[derive(Debug, Default)]
struct Group {
    members: Vec<mpsc::UnboundedSender<Vec<u8>>>,
    next: usize,
    /// Messages published while no member was online.
    backlog: Vec<Vec<u8>>,
}

impl Group {
    /// Round-robin over live members; parks the message when none is live.
    fn deliver(&mut self, payload: Vec<u8>) {
        self.members.retain(|tx| !tx.is_closed());
        let mut payload = payload;
        for _ in 0..self.members.len() {
            let idx = self.next % self.members.len();
            self.next = self.next.wrapping_add(1);
            match self.members[idx].send(payload) {
                Ok(()) => return,
                Err(mpsc::error::SendError(returned)) => payload = returned,
            }
        }
        self.backlog.push(payload);
    }
}

/// In-memory durable pub/sub broker.
///
/// - Queue groups are created on first subscribe and live as long as the broker
/// - Within a group, live members receive messages round-robin
/// - Messages for a group with no live member are replayed to the next member
/// - Messages still queued for a member when it closes go back to its group
/// - Channels without any group drop messages
#[derive(Debug, Default)]
pub struct InMemoryBroker {
    channels: Arc<Mutex<Channels>>,
}

type Channels = HashMap<String, HashMap<String, Group>>;

/// Hand undelivered messages of a closed member back to its group.
fn requeue(channels: &Mutex<Channels>, channel: &str, group: &str, leftover: Vec<Vec<u8>>) {
    if leftover.is_empty() {
        return;
    }
    match channels.lock() {
        Ok(mut channels) => {
            if let Some(group) = channels.get_mut(channel).and_then(|g| g.get_mut(group)) {
                for payload in leftover {
                    group.deliver(payload);
                }
            }
        }
        Err(_) => tracing::warn!(channel, group, "broker state poisoned; queued messages lost"),
    }
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Broker for InMemoryBroker {
    async fn publish(&self, channel: &str, payload: Vec<u8>) -> Result<(), BrokerError> {
        let mut channels = self
            .channels
            .lock()
            .map_err(|_| BrokerError::Publish("broker state poisoned".to_string()))?;
        if let Some(groups) = channels.get_mut(channel) {
            for group in groups.values_mut() {
                group.deliver(payload.clone());
            }
        }
        Ok(())
    }

    async fn queue_subscribe(
        &self,
        channel: &str,
        group: &str,
        _durable: &str,
        handler: MessageHandler,
    ) -> Result<SubscriptionHandle, BrokerError> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();
        {
            let mut channels = self
                .channels
                .lock()
                .map_err(|_| BrokerError::Subscribe("broker state poisoned".to_string()))?;
            let group = channels
                .entry(channel.to_string())
                .or_default()
                .entry(group.to_string())
                .or_default();
            for parked in group.backlog.drain(..) {
                let _ = tx.send(parked);
            }
            group.members.push(tx);
        }

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let state = self.channels.clone();
        let (channel_name, group_name) = (channel.to_string(), group.to_string());
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => break,
                    next = rx.recv() => match next {
                        Some(payload) => handler(payload).await,
                        None => break,
                    },
                }
            }
            rx.close();
            let mut leftover = Vec::new();
            while let Ok(payload) = rx.try_recv() {
                leftover.push(payload);
            }
            requeue(&state, &channel_name, &group_name, leftover);
        });

        Ok(SubscriptionHandle::new(channel, shutdown_tx, task))
    }
}

/// Hands out connections to one shared [`InMemoryBroker`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryConnector {
    broker: Arc<InMemoryBroker>,
}

impl InMemoryConnector {
    pub fn new(broker: Arc<InMemoryBroker>) -> Self {
        Self { broker }
    }

    pub fn broker(&self) -> Arc<InMemoryBroker> {
        self.broker.clone()
    }
}

#[async_trait]
impl Connector for InMemoryConnector {
    async fn connect(
        &self,
        _cluster_id: &str,
        _client_id: &str,
        _endpoint: &str,
    ) -> Result<Arc<dyn Broker>, BrokerError> {
        Ok(self.broker.clone())
    }
}
