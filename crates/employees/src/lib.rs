//! Employee domain: entities, mutation requests, validation, role resolution
//! and the storage contracts the gateway depends on.

pub mod employee;
pub mod error;
pub mod factory;
pub mod repository;
pub mod request;
pub mod role;
pub mod snapshot;

pub use employee::{EMPLOYEE_KIND, Employee};
pub use error::EmployeeError;
pub use factory::EmployeeFactory;
pub use repository::{EmployeeChanges, EmployeeRepository, RoleRepository, StoreError};
pub use request::{EmployeeFilter, NewEmployeeRequest, UpdateEmployeeRequest};
pub use role::{Role, RoleFilter, RoleRef};
pub use snapshot::EmployeeSnapshot;
