use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::claims::has_valid_window;
use crate::{AuthError, ClaimsSource, IdentityClaims, TokenFault};

/// Issues and verifies HMAC-signed identity tokens.
///
/// The secret is injected once at construction; nothing in this crate reads
/// it from the environment.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

const ALLOWED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

impl TokenService {
    pub const DEFAULT_TTL_MINUTES: i64 = 60;

    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, AuthError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(AuthError::Misconfigured("signing secret is empty"));
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl: Duration::minutes(Self::DEFAULT_TTL_MINUTES),
        })
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `source`, expiring `ttl` from now.
    pub fn issue(&self, source: &impl ClaimsSource) -> Result<String, AuthError> {
        self.sign(&IdentityClaims::issue(source, Utc::now(), self.ttl))
    }

    /// Sign already-built claims.
    pub fn sign(&self, claims: &IdentityClaims) -> Result<String, AuthError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AuthError::Decryption(TokenFault::Jwt(e)))
    }

    pub fn verify(&self, token: &str) -> Result<IdentityClaims, AuthError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify signature, algorithm family and expiry, then the semantic
    /// validity of the claims window relative to `now`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<IdentityClaims, AuthError> {
        if token.split('.').count() != 3 {
            return Err(AuthError::Decryption(TokenFault::Segments));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = ALLOWED_ALGORITHMS.to_vec();
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        let data = jsonwebtoken::decode::<IdentityClaims>(token, &self.decoding, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Decryption(TokenFault::Expired),
                _ => AuthError::Decryption(TokenFault::Jwt(e)),
            })?;

        if !has_valid_window(&data.claims, now) {
            return Err(AuthError::InvalidToken);
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RoleName;
    use cellcentre_core::EntityId;

    struct Staff {
        id: EntityId,
        roles: Vec<&'static str>,
    }

    impl ClaimsSource for Staff {
        fn entity_kind(&self) -> &str {
            "employee"
        }
        fn entity_id(&self) -> EntityId {
            self.id
        }
        fn login(&self) -> &str {
            "admin@page.com"
        }
        fn role_names(&self) -> Vec<RoleName> {
            self.roles.iter().map(|r| RoleName::from(*r)).collect()
        }
    }

    fn service() -> TokenService {
        TokenService::new("unit-test-secret").unwrap()
    }

    #[test]
    fn issue_then_verify_returns_source_claims() {
        let staff = Staff {
            id: EntityId::new(),
            roles: vec!["admin", "serviceman", "admin"],
        };
        let svc = service();
        let before = Utc::now();
        let token = svc.issue(&staff).unwrap();
        let claims = svc.verify(&token).unwrap();

        assert_eq!(claims.entity, "employee");
        assert_eq!(claims.entity_id, staff.id);
        assert_eq!(claims.login, "admin@page.com");
        assert_eq!(claims.roles, staff.role_names());

        let lifetime = claims.expires_at - claims.issued_at;
        assert_eq!(lifetime, Duration::minutes(60));
        assert!(claims.expires_at >= before + Duration::minutes(59));
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(matches!(
            TokenService::new(""),
            Err(AuthError::Misconfigured(_))
        ));
    }

    #[test]
    fn expired_token_fails_with_expiry_cause() {
        let svc = service();
        let issued = Utc::now() - Duration::hours(2);
        let claims = IdentityClaims {
            entity: "employee".into(),
            issued_at: issued,
            expires_at: issued + Duration::minutes(60),
            ..IdentityClaims::default()
        };
        let token = svc.sign(&claims).unwrap();
        let err = svc.verify(&token).unwrap_err();
        assert!(matches!(err, AuthError::Decryption(TokenFault::Expired)));
        assert_eq!(
            err.to_string(),
            "error during token decryption (token is expired)"
        );
    }

    #[test]
    fn malformed_token_fails_with_segment_cause() {
        let err = service().verify("not-a-token").unwrap_err();
        assert!(matches!(err, AuthError::Decryption(TokenFault::Segments)));
        assert_eq!(
            err.to_string(),
            "error during token decryption (token contains an invalid number of segments)"
        );
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let other = TokenService::new("another-secret").unwrap();
        let staff = Staff {
            id: EntityId::new(),
            roles: vec!["admin"],
        };
        let token = other.issue(&staff).unwrap();
        assert!(matches!(
            service().verify(&token),
            Err(AuthError::Decryption(TokenFault::Jwt(_)))
        ));
    }

    #[test]
    fn hs512_tokens_are_accepted() {
        let svc = service();
        let now = Utc::now();
        let claims = IdentityClaims {
            entity: "employee".into(),
            issued_at: now,
            expires_at: now + Duration::minutes(5),
            ..IdentityClaims::default()
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"unit-test-secret"),
        )
        .unwrap();
        assert_eq!(svc.verify(&token).unwrap().entity, "employee");
    }

    #[test]
    fn inverted_window_is_invalid_token() {
        let svc = service();
        let now = Utc::now();
        let claims = IdentityClaims {
            issued_at: now + Duration::minutes(30),
            expires_at: now + Duration::minutes(10),
            ..IdentityClaims::default()
        };
        let token = svc.sign(&claims).unwrap();
        assert!(matches!(svc.verify(&token), Err(AuthError::InvalidToken)));
    }
}
