use std::sync::Arc;

use tracing::{debug, instrument};

use cellcentre_auth::{AuthError, CredentialVerifier, TokenService};
use cellcentre_employees::{EMPLOYEE_KIND, EmployeeFilter, EmployeeRepository, StoreError};

/// `Authenticate(entityKind, login, password) -> token`.
#[derive(Clone)]
pub struct AuthService {
    employees: Arc<dyn EmployeeRepository>,
    verifier: CredentialVerifier,
    tokens: Arc<TokenService>,
}

impl AuthService {
    pub fn new(
        employees: Arc<dyn EmployeeRepository>,
        verifier: CredentialVerifier,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            employees,
            verifier,
            tokens,
        }
    }

    /// Unknown login and wrong password are indistinguishable to the caller.
    #[instrument(skip(self, password), err(Display))]
    pub async fn authenticate(
        &self,
        entity: &str,
        login: &str,
        password: &str,
    ) -> Result<String, AuthError> {
        if login.is_empty() || password.is_empty() || entity != EMPLOYEE_KIND {
            return Err(AuthError::InvalidParameters);
        }

        let employee = match self.employees.get(&EmployeeFilter::by_email(login)).await {
            Ok(employee) => employee,
            Err(StoreError::NotFound(_)) => return Err(AuthError::InvalidCredentials),
            Err(e) => {
                debug!(error = %e, "employee lookup failed during authentication");
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !self.verifier.verify(&employee.password_hash, password) {
            return Err(AuthError::InvalidCredentials);
        }

        self.tokens.issue(&employee)
    }
}
