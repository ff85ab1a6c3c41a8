use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use cellcentre_core::EmployeeId;

use crate::{Employee, EmployeeFilter, Role, RoleFilter};

/// Storage round-trip failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Resolved field changes applied by [`EmployeeRepository::update`].
///
/// Unlike the request, the password is already hashed and roles are resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeeChanges {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub roles: Option<Vec<Role>>,
}

/// Document store of employees keyed by id, with email as unique alternate key.
///
/// Implementations own the `created_at`/`updated_at` stamps.
#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    async fn get(&self, filter: &EmployeeFilter) -> Result<Employee, StoreError>;

    async fn create(&self, employee: Employee) -> Result<Employee, StoreError>;

    async fn update(
        &self,
        id: EmployeeId,
        changes: EmployeeChanges,
    ) -> Result<Employee, StoreError>;

    async fn delete(&self, filter: &EmployeeFilter) -> Result<(), StoreError>;
}

#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn get(&self, filter: &RoleFilter) -> Result<Role, StoreError>;
}

#[async_trait]
impl<S> EmployeeRepository for Arc<S>
where
    S: EmployeeRepository + ?Sized,
{
    async fn get(&self, filter: &EmployeeFilter) -> Result<Employee, StoreError> {
        (**self).get(filter).await
    }

    async fn create(&self, employee: Employee) -> Result<Employee, StoreError> {
        (**self).create(employee).await
    }

    async fn update(
        &self,
        id: EmployeeId,
        changes: EmployeeChanges,
    ) -> Result<Employee, StoreError> {
        (**self).update(id, changes).await
    }

    async fn delete(&self, filter: &EmployeeFilter) -> Result<(), StoreError> {
        (**self).delete(filter).await
    }
}

#[async_trait]
impl<S> RoleRepository for Arc<S>
where
    S: RoleRepository + ?Sized,
{
    async fn get(&self, filter: &RoleFilter) -> Result<Role, StoreError> {
        (**self).get(filter).await
    }
}
