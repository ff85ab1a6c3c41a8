use serde::{Deserialize, Serialize};

use cellcentre_auth::RoleName;
use cellcentre_core::RoleId;

/// A stored role. Authorization refers to it by `name`, storage by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
}

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: RoleId::new(),
            name: name.into(),
        }
    }

    pub fn role_name(&self) -> RoleName {
        RoleName::from(self.name.clone())
    }
}

/// Role as referenced from a mutation request: by id, by name, or both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RoleId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl RoleRef {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: Some(name.into()),
        }
    }
}

impl From<&Role> for RoleRef {
    fn from(role: &Role) -> Self {
        Self {
            id: Some(role.id),
            name: Some(role.name.clone()),
        }
    }
}

/// Lookup key for a role; `id` wins when both are set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleFilter {
    pub id: Option<RoleId>,
    pub name: Option<String>,
}

impl RoleFilter {
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.name.as_deref().is_none_or(str::is_empty)
    }
}

impl From<&RoleRef> for RoleFilter {
    fn from(r: &RoleRef) -> Self {
        Self {
            id: r.id,
            name: r.name.clone(),
        }
    }
}
