use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use cellcentre_core::EmployeeId;
use cellcentre_employees::{
    Employee, EmployeeChanges, EmployeeFilter, EmployeeRepository, StoreError,
};

/// In-memory employee store keyed by id, with email as unique alternate key.
#[derive(Debug, Default)]
pub struct InMemoryEmployeeStore {
    inner: RwLock<HashMap<EmployeeId, Employee>>,
}

impl InMemoryEmployeeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("employee store lock poisoned".to_string())
}

fn find<'a>(
    map: &'a HashMap<EmployeeId, Employee>,
    filter: &EmployeeFilter,
) -> Result<&'a Employee, StoreError> {
    let found = match (&filter.id, filter.email.as_deref()) {
        (Some(id), _) => map.get(id),
        (None, Some(email)) if !email.is_empty() => map.values().find(|e| e.email == email),
        _ => return Err(StoreError::InvalidFilter("employee filter is empty".to_string())),
    };
    found.ok_or_else(|| StoreError::NotFound("employee".to_string()))
}

#[async_trait]
impl EmployeeRepository for InMemoryEmployeeStore {
    async fn get(&self, filter: &EmployeeFilter) -> Result<Employee, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        find(&map, filter).cloned()
    }

    async fn create(&self, mut employee: Employee) -> Result<Employee, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if map.contains_key(&employee.id) {
            return Err(StoreError::Conflict(format!("employee {} exists", employee.id)));
        }
        if map.values().any(|e| e.email == employee.email) {
            return Err(StoreError::Conflict(format!(
                "email {} already registered",
                employee.email
            )));
        }
        let now = Utc::now();
        employee.created_at = now;
        employee.updated_at = now;
        map.insert(employee.id, employee.clone());
        Ok(employee)
    }

    async fn update(
        &self,
        id: EmployeeId,
        changes: EmployeeChanges,
    ) -> Result<Employee, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if let Some(email) = &changes.email {
            if map.values().any(|e| e.id != id && &e.email == email) {
                return Err(StoreError::Conflict(format!("email {email} already registered")));
            }
        }
        let employee = map
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("employee {id}")))?;

        if let Some(email) = changes.email {
            employee.email = email;
        }
        if let Some(hash) = changes.password_hash {
            employee.password_hash = hash;
        }
        if let Some(name) = changes.name {
            employee.name = name;
        }
        if let Some(phone) = changes.phone {
            employee.phone = phone;
        }
        if let Some(roles) = changes.roles {
            employee.roles = roles;
        }
        employee.updated_at = Utc::now();
        Ok(employee.clone())
    }

    async fn delete(&self, filter: &EmployeeFilter) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        let id = find(&map, filter)?.id;
        map.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellcentre_employees::Role;

    fn employee(email: &str) -> Employee {
        let epoch = chrono::DateTime::<Utc>::default();
        Employee {
            id: EmployeeId::new(),
            email: email.into(),
            password_hash: "hash".into(),
            name: "Someone".into(),
            phone: String::new(),
            created_at: epoch,
            updated_at: epoch,
            roles: vec![Role::new("admin")],
        }
    }

    #[tokio::test]
    async fn create_stamps_and_enforces_unique_email() {
        let store = InMemoryEmployeeStore::new();
        let stored = store.create(employee("a@page.com")).await.unwrap();
        assert!(stored.created_at > chrono::DateTime::<Utc>::default());
        assert!(matches!(
            store.create(employee("a@page.com")).await,
            Err(StoreError::Conflict(_))
        ));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn get_by_id_or_email() {
        let store = InMemoryEmployeeStore::new();
        let stored = store.create(employee("a@page.com")).await.unwrap();
        assert_eq!(store.get(&EmployeeFilter::by_id(stored.id)).await.unwrap().id, stored.id);
        assert_eq!(
            store.get(&EmployeeFilter::by_email("a@page.com")).await.unwrap().id,
            stored.id
        );
        assert!(matches!(
            store.get(&EmployeeFilter::by_email("b@page.com")).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn update_applies_only_present_fields() {
        let store = InMemoryEmployeeStore::new();
        let stored = store.create(employee("a@page.com")).await.unwrap();
        let updated = store
            .update(
                stored.id,
                EmployeeChanges {
                    name: Some("Renamed".into()),
                    ..EmployeeChanges::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.email, "a@page.com");
        assert_eq!(updated.password_hash, "hash");
        assert!(updated.updated_at >= stored.updated_at);

        assert!(matches!(
            store.update(EmployeeId::new(), EmployeeChanges::default()).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_by_email() {
        let store = InMemoryEmployeeStore::new();
        store.create(employee("a@page.com")).await.unwrap();
        store.delete(&EmployeeFilter::by_email("a@page.com")).await.unwrap();
        assert!(store.is_empty());
        assert!(store.delete(&EmployeeFilter::by_email("a@page.com")).await.is_err());
    }
}
