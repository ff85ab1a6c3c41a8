use serde::{Deserialize, Serialize};

use cellcentre_core::EmployeeId;

use crate::{EmployeeError, RoleRef};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEmployeeRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub roles: Vec<RoleRef>,
}

impl NewEmployeeRequest {
    pub fn validate(&self) -> Result<(), EmployeeError> {
        if self.email.trim().is_empty() {
            return Err(EmployeeError::invalid_data("email is required"));
        }
        if self.password.is_empty() {
            return Err(EmployeeError::invalid_data("password is required"));
        }
        if self.roles.is_empty() {
            return Err(EmployeeError::invalid_roles("at least one role is required"));
        }
        Ok(())
    }
}

/// Partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateEmployeeRequest {
    pub id: EmployeeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<RoleRef>>,
}

impl UpdateEmployeeRequest {
    pub fn new(id: EmployeeId) -> Self {
        Self {
            id,
            email: None,
            password: None,
            name: None,
            phone: None,
            roles: None,
        }
    }

    pub fn validate(&self) -> Result<(), EmployeeError> {
        if self.email.as_deref().is_some_and(|e| e.trim().is_empty()) {
            return Err(EmployeeError::invalid_data("email cannot be blank"));
        }
        if self.password.as_deref().is_some_and(str::is_empty) {
            return Err(EmployeeError::invalid_data("password cannot be blank"));
        }
        if self.roles.as_ref().is_some_and(Vec::is_empty) {
            return Err(EmployeeError::invalid_roles("role list cannot be emptied"));
        }
        Ok(())
    }

    /// Copy safe to embed in an event: the password is dropped.
    pub fn redacted(&self) -> Self {
        Self {
            password: None,
            ..self.clone()
        }
    }
}

/// Lookup/delete key for an employee; `id` wins when both are set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EmployeeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl EmployeeFilter {
    pub fn by_id(id: EmployeeId) -> Self {
        Self {
            id: Some(id),
            email: None,
        }
    }

    pub fn by_email(email: impl Into<String>) -> Self {
        Self {
            id: None,
            email: Some(email.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.email.as_deref().is_none_or(str::is_empty)
    }
}
