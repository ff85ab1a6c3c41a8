//! Infrastructure layer: broker connectivity and storage adapters.

pub mod event_bus;
pub mod event_log;
pub mod store;

pub use event_log::InMemoryEventLog;
pub use store::{InMemoryEmployeeStore, InMemoryRoleStore};

#[cfg(feature = "nats")]
pub use event_bus::{NatsBroker, NatsConnector};

#[cfg(feature = "postgres")]
pub use event_log::PostgresEventLog;
#[cfg(feature = "postgres")]
pub use store::{PostgresEmployeeStore, PostgresRoleStore};
