//! Append-only event-log storage backing the event-logger consumer.

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use in_memory::InMemoryEventLog;
#[cfg(feature = "postgres")]
pub use postgres::PostgresEventLog;
