use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use cellcentre_core::RoleId;
use cellcentre_employees::{Role, RoleFilter, RoleRepository, StoreError};

/// Role names seeded by [`InMemoryRoleStore::with_defaults`].
pub const DEFAULT_ROLES: [&str; 2] = ["admin", "serviceman"];

#[derive(Debug, Default)]
pub struct InMemoryRoleStore {
    inner: RwLock<HashMap<RoleId, Role>>,
}

impl InMemoryRoleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let store = Self::new();
        for name in DEFAULT_ROLES {
            store.insert(Role::new(name));
        }
        store
    }

    pub fn insert(&self, role: Role) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(role.id, role);
        }
    }
}

#[async_trait]
impl RoleRepository for InMemoryRoleStore {
    async fn get(&self, filter: &RoleFilter) -> Result<Role, StoreError> {
        let map = self
            .inner
            .read()
            .map_err(|_| StoreError::Backend("role store lock poisoned".to_string()))?;
        let found = match (&filter.id, filter.name.as_deref()) {
            (Some(id), _) => map.get(id).cloned(),
            (None, Some(name)) if !name.is_empty() => {
                map.values().find(|r| r.name == name).cloned()
            }
            _ => return Err(StoreError::InvalidFilter("role filter is empty".to_string())),
        };
        found.ok_or_else(|| {
            StoreError::NotFound(
                filter
                    .name
                    .clone()
                    .or_else(|| filter.id.map(|id| id.to_string()))
                    .unwrap_or_default(),
            )
        })
    }
}
