use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::{AuthError, IdentityClaims, RequestContext, RequestMetadata, RoleName, TokenService};

/// Metadata key carrying the raw token (no `Bearer` prefix handling).
pub const AUTHORIZATION_KEY: &str = "authorization";

/// Role policy check over already-verified claims.
///
/// - No IO
/// - No panics
/// - Any-of semantics, exact case-sensitive names
pub fn authorize(claims: &IdentityClaims, allowed: &[RoleName]) -> Result<(), AuthError> {
    let held: HashSet<&str> = claims.roles.iter().map(|r| r.as_str()).collect();
    if allowed.iter().any(|role| held.contains(role.as_str())) {
        Ok(())
    } else {
        Err(AuthError::InsufficientRights)
    }
}

/// Claims attached to `ctx`, or the zero-value claims when none are.
pub fn obtain_from_context(ctx: &RequestContext) -> IdentityClaims {
    ctx.claims().cloned().unwrap_or_default()
}

/// Token-backed gate in front of protected operations.
#[derive(Debug, Clone)]
pub struct AuthorizationGate {
    tokens: Arc<TokenService>,
}

impl AuthorizationGate {
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }

    /// Read the token from `metadata` and verify it.
    pub fn extract_from_metadata(
        &self,
        metadata: &RequestMetadata,
    ) -> Result<IdentityClaims, AuthError> {
        let token = metadata
            .get(AUTHORIZATION_KEY)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;
        self.tokens.verify(token)
    }

    /// Interceptor entry point: authentication without a role requirement.
    /// Attaches the verified claims to `ctx`.
    pub fn authenticate(&self, ctx: &mut RequestContext) -> Result<IdentityClaims, AuthError> {
        let claims = self.extract_from_metadata(ctx.metadata())?;
        ctx.attach_claims(claims.clone());
        Ok(claims)
    }

    /// Authenticate, then require at least one of `allowed` roles.
    pub fn authorize_roles(
        &self,
        ctx: &mut RequestContext,
        allowed: &[RoleName],
    ) -> Result<IdentityClaims, AuthError> {
        let claims = self.extract_from_metadata(ctx.metadata())?;
        if let Err(e) = authorize(&claims, allowed) {
            debug!(login = %claims.login, "caller lacks an allowed role");
            return Err(e);
        }
        ctx.attach_claims(claims.clone());
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn gate() -> (AuthorizationGate, Arc<TokenService>) {
        let tokens = Arc::new(TokenService::new("gate-secret").unwrap());
        (AuthorizationGate::new(tokens.clone()), tokens)
    }

    fn token_with_roles(tokens: &TokenService, roles: &[&'static str]) -> String {
        let now = Utc::now();
        tokens
            .sign(&IdentityClaims {
                entity: "employee".into(),
                login: "admin@page.com".into(),
                roles: roles.iter().map(|r| RoleName::from(*r)).collect(),
                issued_at: now,
                expires_at: now + Duration::minutes(60),
                ..IdentityClaims::default()
            })
            .unwrap()
    }

    fn ctx_with(token: &str) -> RequestContext {
        RequestContext::new(RequestMetadata::new().with("Authorization", token))
    }

    #[test]
    fn admin_is_authorized_and_claims_attached() {
        let (gate, tokens) = gate();
        let mut ctx = ctx_with(&token_with_roles(&tokens, &["admin"]));
        let claims = gate.authorize_roles(&mut ctx, &["admin".into()]).unwrap();
        assert_eq!(claims.login, "admin@page.com");
        assert_eq!(obtain_from_context(&ctx), claims);
    }

    #[test]
    fn disjoint_roles_are_insufficient() {
        let (gate, tokens) = gate();
        let mut ctx = ctx_with(&token_with_roles(&tokens, &["serviceman"]));
        assert!(matches!(
            gate.authorize_roles(&mut ctx, &["admin".into()]),
            Err(AuthError::InsufficientRights)
        ));
        assert!(ctx.claims().is_none());

        let mut ctx = ctx_with(&token_with_roles(&tokens, &[]));
        assert!(matches!(
            gate.authorize_roles(&mut ctx, &["admin".into()]),
            Err(AuthError::InsufficientRights)
        ));
    }

    #[test]
    fn missing_or_empty_header_is_missing_token() {
        let (gate, _) = gate();
        let mut ctx = RequestContext::default();
        assert!(matches!(
            gate.authorize_roles(&mut ctx, &["admin".into()]),
            Err(AuthError::MissingToken)
        ));
        let mut ctx = ctx_with("");
        assert!(matches!(
            gate.authenticate(&mut ctx),
            Err(AuthError::MissingToken)
        ));
    }

    #[test]
    fn authenticate_requires_no_role() {
        let (gate, tokens) = gate();
        let mut ctx = ctx_with(&token_with_roles(&tokens, &[]));
        assert!(gate.authenticate(&mut ctx).is_ok());
        assert!(ctx.claims().is_some());
    }

    #[test]
    fn obtain_without_claims_is_zero_value() {
        let claims = obtain_from_context(&RequestContext::default());
        assert_eq!(claims, IdentityClaims::default());
    }
}
