//! `cellcentre-auth`: authentication/authorization boundary.
//!
//! Token issuance and verification, password hashing, and the role gate.
//! This crate is intentionally decoupled from HTTP and storage: transports
//! hand it a [`RequestContext`] built from their own metadata.

pub mod authorize;
pub mod claims;
pub mod context;
pub mod credentials;
pub mod error;
pub mod principal;
pub mod roles;
pub mod token;

pub use authorize::{AUTHORIZATION_KEY, AuthorizationGate, authorize, obtain_from_context};
pub use claims::IdentityClaims;
pub use context::{RequestContext, RequestMetadata};
pub use credentials::{CredentialError, CredentialVerifier, PasswordPolicy};
pub use error::{AuthError, TokenFault};
pub use principal::ClaimsSource;
pub use roles::RoleName;
pub use token::TokenService;
