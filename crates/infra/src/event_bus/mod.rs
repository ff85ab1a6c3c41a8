//! Infrastructure broker implementations.
//!
//! The broker abstraction lives in `cellcentre-events` as pure mechanics.
//! This module provides the NATS JetStream-backed implementation.

#[cfg(feature = "nats")]
pub mod nats_jetstream;

#[cfg(feature = "nats")]
pub use nats_jetstream::{NatsBroker, NatsConnector};
