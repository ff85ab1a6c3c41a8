use thiserror::Error;

use crate::StoreError;

#[derive(Debug, Error)]
pub enum EmployeeError {
    #[error("invalid employee data: {0}")]
    InvalidData(String),

    #[error("invalid employee roles: {0}")]
    InvalidRoles(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EmployeeError {
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }

    pub fn invalid_roles(msg: impl Into<String>) -> Self {
        Self::InvalidRoles(msg.into())
    }
}
