use thiserror::Error;

/// Failure reasons surfaced by the authentication/authorization boundary.
///
/// Display texts are human-readable and returned to callers as-is.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid parameters")]
    InvalidParameters,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("missing authorization token")]
    MissingToken,

    #[error("invalid token")]
    InvalidToken,

    #[error("error during token decryption ({0})")]
    Decryption(#[source] TokenFault),

    #[error("insufficient rights")]
    InsufficientRights,

    #[error("token service misconfigured: {0}")]
    Misconfigured(&'static str),
}

/// Library-level cause wrapped by [`AuthError::Decryption`].
#[derive(Debug, Error)]
pub enum TokenFault {
    #[error("token contains an invalid number of segments")]
    Segments,

    #[error("token is expired")]
    Expired,

    #[error(transparent)]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl AuthError {
    /// Stable machine-readable code for transport error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidParameters => "invalid_parameters",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::MissingToken => "missing_token",
            AuthError::InvalidToken => "invalid_token",
            AuthError::Decryption(_) => "token_decryption",
            AuthError::InsufficientRights => "insufficient_rights",
            AuthError::Misconfigured(_) => "misconfigured",
        }
    }
}
