use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cellcentre_auth::{ClaimsSource, RoleName};
use cellcentre_core::{EmployeeId, EntityId};

use crate::Role;

/// Entity kind tag used in claims and by the authentication service.
pub const EMPLOYEE_KIND: &str = "employee";

/// A stored employee.
///
/// `password_hash` is never serialized: responses and event payloads cannot
/// leak it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub name: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub roles: Vec<Role>,
}

impl Employee {
    /// Copy with the credential cleared.
    pub fn redacted(&self) -> Self {
        Self {
            password_hash: String::new(),
            ..self.clone()
        }
    }
}

impl ClaimsSource for Employee {
    fn entity_kind(&self) -> &str {
        EMPLOYEE_KIND
    }

    fn entity_id(&self) -> EntityId {
        self.id.into()
    }

    fn login(&self) -> &str {
        &self.email
    }

    fn role_names(&self) -> Vec<RoleName> {
        self.roles.iter().map(Role::role_name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee() -> Employee {
        let now = Utc::now();
        Employee {
            id: EmployeeId::new(),
            email: "admin@page.com".into(),
            password_hash: "$argon2id$secret".into(),
            name: "Admin".into(),
            phone: "+100".into(),
            created_at: now,
            updated_at: now,
            roles: vec![Role::new("admin"), Role::new("serviceman")],
        }
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let json = serde_json::to_value(employee()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "admin@page.com");
    }

    #[test]
    fn claims_source_exposes_login_and_role_names() {
        let e = employee();
        assert_eq!(e.entity_kind(), "employee");
        assert_eq!(e.login(), "admin@page.com");
        assert_eq!(e.entity_id(), EntityId::from(e.id));
        let names: Vec<String> = e.role_names().iter().map(|r| r.to_string()).collect();
        assert_eq!(names, vec!["admin", "serviceman"]);
    }
}
