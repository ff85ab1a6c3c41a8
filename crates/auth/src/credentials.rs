use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("invalid hashing policy: {0}")]
    Policy(String),

    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// Argon2id cost parameters.
///
/// The default is the low-cost profile; deployments override it from
/// configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub memory_kb: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl PasswordPolicy {
    pub const fn low_cost() -> Self {
        Self {
            memory_kb: 1024,
            iterations: 1,
            parallelism: 1,
        }
    }

    fn hasher(&self) -> Result<Argon2<'static>, CredentialError> {
        let params = Params::new(self.memory_kb, self.iterations, self.parallelism, None)
            .map_err(|e| CredentialError::Policy(e.to_string()))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self::low_cost()
    }
}

/// Stateless password hashing and comparison.
#[derive(Debug, Clone, Default)]
pub struct CredentialVerifier {
    policy: PasswordPolicy,
}

impl CredentialVerifier {
    pub fn new(policy: PasswordPolicy) -> Self {
        Self { policy }
    }

    /// Hash `password` into PHC string form. Failures are logged and returned;
    /// callers must refuse to store the credential.
    pub fn hash(&self, password: &str) -> Result<String, CredentialError> {
        let salt = SaltString::generate(&mut OsRng);
        let hashed = self.policy.hasher().and_then(|argon| {
            argon
                .hash_password(password.as_bytes(), &salt)
                .map(|h| h.to_string())
                .map_err(|e| CredentialError::Hash(e.to_string()))
        });
        if let Err(e) = &hashed {
            error!(error = %e, "password hashing failed");
        }
        hashed
    }

    /// Compare `candidate` against a stored hash. Malformed hashes never match.
    pub fn verify(&self, hashed: &str, candidate: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hashed) else {
            return false;
        };
        Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let verifier = CredentialVerifier::default();
        let hashed = verifier.hash("test123").unwrap();
        assert!(hashed.starts_with("$argon2id$"));
        assert!(verifier.verify(&hashed, "test123"));
        assert!(!verifier.verify(&hashed, "test124"));
    }

    #[test]
    fn hashes_are_salted() {
        let verifier = CredentialVerifier::default();
        assert_ne!(
            verifier.hash("same").unwrap(),
            verifier.hash("same").unwrap()
        );
    }

    #[test]
    fn malformed_hash_never_matches() {
        let verifier = CredentialVerifier::default();
        assert!(!verifier.verify("", "x"));
        assert!(!verifier.verify("plaintext", "plaintext"));
    }

    #[test]
    fn invalid_policy_is_an_error() {
        let verifier = CredentialVerifier::new(PasswordPolicy {
            memory_kb: 1,
            iterations: 0,
            parallelism: 1,
        });
        assert!(matches!(
            verifier.hash("pw"),
            Err(CredentialError::Policy(_))
        ));
    }
}
