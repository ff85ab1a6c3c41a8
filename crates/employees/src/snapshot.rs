use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cellcentre_core::EmployeeId;

use crate::{Employee, EmployeeFilter, RoleRef, UpdateEmployeeRequest};

/// Uniformly typed employee view stored in the event log.
///
/// Create events fill every field; update events only the fields present in
/// the request; delete events only the filter keys. Never carries credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EmployeeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub roles: Vec<RoleRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&Employee> for EmployeeSnapshot {
    fn from(e: &Employee) -> Self {
        Self {
            id: Some(e.id),
            email: Some(e.email.clone()),
            name: Some(e.name.clone()),
            phone: Some(e.phone.clone()),
            roles: e.roles.iter().map(RoleRef::from).collect(),
            created_at: Some(e.created_at),
            updated_at: Some(e.updated_at),
        }
    }
}

impl From<&UpdateEmployeeRequest> for EmployeeSnapshot {
    fn from(r: &UpdateEmployeeRequest) -> Self {
        Self {
            id: Some(r.id),
            email: r.email.clone(),
            name: r.name.clone(),
            phone: r.phone.clone(),
            roles: r.roles.clone().unwrap_or_default(),
            created_at: None,
            updated_at: None,
        }
    }
}

impl From<&EmployeeFilter> for EmployeeSnapshot {
    fn from(f: &EmployeeFilter) -> Self {
        Self {
            id: f.id,
            email: f.email.clone(),
            ..Self::default()
        }
    }
}
