use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use cellcentre_core::EmployeeId;

use crate::{
    Employee, EmployeeChanges, EmployeeError, NewEmployeeRequest, Role, RoleFilter, RoleRef,
    RoleRepository, StoreError, UpdateEmployeeRequest,
};

/// Turns mutation requests into storable employees, resolving every role
/// reference to its canonical stored form.
#[derive(Clone)]
pub struct EmployeeFactory {
    roles: Arc<dyn RoleRepository>,
}

impl EmployeeFactory {
    pub fn new(roles: Arc<dyn RoleRepository>) -> Self {
        Self { roles }
    }

    pub async fn resolve_roles(&self, refs: &[RoleRef]) -> Result<Vec<Role>, EmployeeError> {
        let mut resolved = Vec::with_capacity(refs.len());
        for role_ref in refs {
            let filter = RoleFilter::from(role_ref);
            if filter.is_empty() {
                return Err(EmployeeError::invalid_roles("role reference has neither id nor name"));
            }
            match self.roles.get(&filter).await {
                Ok(role) => resolved.push(role),
                Err(StoreError::NotFound(what)) => {
                    debug!(role = %what, "unknown role in request");
                    return Err(EmployeeError::invalid_roles(format!("unknown role {what}")));
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(resolved)
    }

    /// Build a new employee with a fresh id. Timestamps are provisional; the
    /// store stamps them on insert.
    pub async fn new_employee(
        &self,
        request: &NewEmployeeRequest,
        password_hash: String,
    ) -> Result<Employee, EmployeeError> {
        let roles = self.resolve_roles(&request.roles).await?;
        let now = Utc::now();
        Ok(Employee {
            id: EmployeeId::new(),
            email: request.email.trim().to_string(),
            password_hash,
            name: request.name.clone(),
            phone: request.phone.clone(),
            created_at: now,
            updated_at: now,
            roles,
        })
    }

    pub async fn changes(
        &self,
        request: &UpdateEmployeeRequest,
        password_hash: Option<String>,
    ) -> Result<EmployeeChanges, EmployeeError> {
        let roles = match &request.roles {
            Some(refs) => Some(self.resolve_roles(refs).await?),
            None => None,
        };
        Ok(EmployeeChanges {
            email: request.email.as_ref().map(|e| e.trim().to_string()),
            password_hash,
            name: request.name.clone(),
            phone: request.phone.clone(),
            roles,
        })
    }
}
