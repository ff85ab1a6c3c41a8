//! Best-effort, fire-and-forget event publication for request handlers.
//!
//! Handlers submit a mutation plus the caller's verified claims and return
//! immediately. A worker builds the envelope and publishes it on a detached
//! task. No backpressure, no retry, no ordering; failures are logged only.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, warn};

use cellcentre_auth::IdentityClaims;
use cellcentre_employees::{Employee, EmployeeFilter, UpdateEmployeeRequest};

use crate::{BusError, EnvelopeError, EventBus, EventEnvelope, EventFactory};

/// Accepted mutation awaiting publication.
#[derive(Debug, Clone)]
pub enum Mutation {
    Created(Employee),
    Updated(UpdateEmployeeRequest),
    Deleted(EmployeeFilter),
}

#[derive(Debug)]
struct PendingEvent {
    claims: IdentityClaims,
    mutation: Mutation,
    accepted_at: DateTime<Utc>,
}

impl PendingEvent {
    /// `created_at` is the acceptance time, not the publication time.
    fn into_envelope(self, factory: &EventFactory) -> Result<EventEnvelope, EnvelopeError> {
        let envelope = match self.mutation {
            Mutation::Created(employee) => factory.new_entity(&self.claims, &employee),
            Mutation::Updated(request) => factory.update_entity(&self.claims, &request),
            Mutation::Deleted(filter) => factory.delete_entity(&self.claims, &filter)?,
        };
        Ok(envelope.stamped_at(self.accepted_at))
    }
}

/// Submission side, cheap to clone into every handler.
#[derive(Debug, Clone)]
pub struct PublishQueue {
    tx: mpsc::UnboundedSender<PendingEvent>,
}

/// Worker side; owns in-flight publishes until [`PublishWorker::shutdown`].
#[derive(Debug)]
pub struct PublishWorker {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PublishQueue {
    /// Start the worker. Refuses to start on an unconnected bus.
    pub async fn start(
        bus: Arc<EventBus>,
        factory: EventFactory,
    ) -> Result<(PublishQueue, PublishWorker), BusError> {
        if !bus.is_connected().await {
            return Err(BusError::NotConnected);
        }
        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run(bus, factory, rx, shutdown_rx));
        Ok((
            PublishQueue { tx },
            PublishWorker {
                shutdown: shutdown_tx,
                task,
            },
        ))
    }

    /// Hand off a mutation for publication. Never blocks, never fails the caller.
    pub fn submit(&self, claims: IdentityClaims, mutation: Mutation) {
        let pending = PendingEvent {
            claims,
            mutation,
            accepted_at: Utc::now(),
        };
        if self.tx.send(pending).is_err() {
            warn!("publish queue closed; event dropped");
        }
    }
}

impl PublishWorker {
    /// Stop accepting submissions and wait for everything already submitted
    /// to finish publishing.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            error!(error = %e, "publish worker ended abnormally");
        }
    }
}

async fn run(
    bus: Arc<EventBus>,
    factory: EventFactory,
    mut rx: mpsc::UnboundedReceiver<PendingEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut in_flight = JoinSet::new();
    let mut closing = false;

    loop {
        tokio::select! {
            changed = shutdown.changed(), if !closing => {
                closing = true;
                if changed.is_ok() {
                    rx.close();
                }
            }
            next = rx.recv() => match next {
                Some(pending) => {
                    let bus = bus.clone();
                    let factory = factory.clone();
                    in_flight.spawn(async move { publish_one(&bus, &factory, pending).await });
                }
                None => break,
            },
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(e) = joined {
                    error!(error = %e, "publish task panicked");
                }
            }
        }
    }

    while let Some(joined) = in_flight.join_next().await {
        if let Err(e) = joined {
            error!(error = %e, "publish task panicked");
        }
    }
}

async fn publish_one(bus: &EventBus, factory: &EventFactory, pending: PendingEvent) {
    let envelope = match pending.into_envelope(factory) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!(error = %e, "event dropped before publication");
            return;
        }
    };
    match bus.publish(&envelope).await {
        Ok(()) => debug!(event_id = %envelope.event_id(), "event handed to broker"),
        Err(e) => error!(
            event_id = %envelope.event_id(),
            channel = envelope.channel(),
            error = %e,
            "event publication failed"
        ),
    }
}
