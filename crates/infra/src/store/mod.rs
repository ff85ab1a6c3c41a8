//! Employee and role stores: in-memory (tests/dev) and Postgres.

pub mod employees;
pub mod roles;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use employees::InMemoryEmployeeStore;
pub use roles::InMemoryRoleStore;

#[cfg(feature = "postgres")]
pub use postgres::{PostgresEmployeeStore, PostgresRoleStore};
