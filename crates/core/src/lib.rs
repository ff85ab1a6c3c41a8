//! `cellcentre-core`: shared domain building blocks.
//!
//! Identifiers and the domain error model. No infrastructure concerns.

pub mod error;
pub mod id;

pub use error::DomainError;
pub use id::{EmployeeId, EntityId, RoleId};
