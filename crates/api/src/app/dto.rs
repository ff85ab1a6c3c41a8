use serde::{Deserialize, Serialize};

use cellcentre_core::EmployeeId;
use cellcentre_employees::{EmployeeFilter, RoleRef, UpdateEmployeeRequest};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct AuthenticateRequest {
    #[serde(default)]
    pub entity: String,
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: String,
}

/// `?id=&email=` query of the employee endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct EmployeeQuery {
    pub id: Option<EmployeeId>,
    pub email: Option<String>,
}

impl From<EmployeeQuery> for EmployeeFilter {
    fn from(q: EmployeeQuery) -> Self {
        EmployeeFilter {
            id: q.id,
            email: q.email,
        }
    }
}

/// Update body; the id comes from the path.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateEmployeeBody {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub roles: Option<Vec<RoleRef>>,
}

impl UpdateEmployeeBody {
    pub fn into_request(self, id: EmployeeId) -> UpdateEmployeeRequest {
        UpdateEmployeeRequest {
            id,
            email: self.email,
            password: self.password,
            name: self.name,
            phone: self.phone,
            roles: self.roles,
        }
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}
