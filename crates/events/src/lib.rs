//! Event-sourcing pipeline: envelopes, wire codec, broker abstraction,
//! the publishing bus and the event-log consumer.

pub mod broker;
pub mod bus;
pub mod codec;
pub mod consumer;
pub mod envelope;
pub mod factory;
pub mod in_memory_bus;
pub mod publish_queue;
pub mod record;

pub use broker::{Broker, BrokerError, Connector, MessageHandler, SubscriptionHandle, handler_fn};
pub use bus::{BusError, EventBus};
pub use codec::{CodecError, decode, encode};
pub use consumer::{ConsumeError, EventLogger, durable_name, queue_group};
pub use envelope::{EventData, EventEnvelope, EventType, Originator};
pub use factory::{EMPLOYEES_CHANNEL, EnvelopeError, EventFactory};
pub use in_memory_bus::{InMemoryBroker, InMemoryConnector};
pub use publish_queue::{Mutation, PublishQueue, PublishWorker};
pub use record::{EventRecordRepository, RecordError, StoredEventRecord};
