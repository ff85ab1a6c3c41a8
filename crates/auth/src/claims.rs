use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use cellcentre_core::EntityId;

use crate::{ClaimsSource, RoleName};

/// Identity claims embedded in a signed token.
///
/// Timestamps are carried as JWT NumericDate seconds (`iat`/`exp`). The
/// `Default` value is the zero identity returned when a request context has
/// no verified claims attached.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Entity kind tag (e.g. "employee").
    pub entity: String,

    pub entity_id: EntityId,

    pub login: String,

    /// Role names in issuance order; duplicates are preserved.
    #[serde(default)]
    pub roles: Vec<RoleName>,

    /// Issued-at timestamp.
    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp.
    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

impl IdentityClaims {
    /// Build claims for `source` issued at `now` and valid for `ttl`.
    pub fn issue(source: &impl ClaimsSource, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            entity: source.entity_kind().to_string(),
            entity_id: source.entity_id(),
            login: source.login().to_string(),
            roles: source.role_names(),
            issued_at: now,
            expires_at: now + ttl,
        }
    }

    /// Any-of role check: exact, case-sensitive name equality.
    pub fn has_any_role(&self, allowed: &[RoleName]) -> bool {
        self.roles.iter().any(|role| allowed.contains(role))
    }
}

/// Tolerated clock drift, in seconds, when checking the issue instant.
pub const CLOCK_SKEW_SECS: i64 = 60;

/// Semantic validity of a decoded token's time window.
///
/// Expiry itself is enforced while decoding; this rejects windows that could
/// never have been produced by the token service.
pub fn has_valid_window(claims: &IdentityClaims, now: DateTime<Utc>) -> bool {
    if claims.expires_at <= claims.issued_at {
        return false;
    }
    claims.issued_at <= now + Duration::seconds(CLOCK_SKEW_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn claims_with_roles(roles: &[&'static str]) -> IdentityClaims {
        IdentityClaims {
            roles: roles.iter().map(|r| RoleName::from(*r)).collect(),
            ..IdentityClaims::default()
        }
    }

    #[test]
    fn any_of_role_matching() {
        let claims = claims_with_roles(&["serviceman", "admin"]);
        assert!(claims.has_any_role(&["admin".into()]));
        assert!(!claims.has_any_role(&["Admin".into()]));
        assert!(!claims_with_roles(&[]).has_any_role(&["admin".into()]));
    }

    #[test]
    fn default_claims_carry_no_identity() {
        let claims = IdentityClaims::default();
        assert!(claims.entity.is_empty());
        assert!(claims.entity_id.is_nil());
        assert!(claims.roles.is_empty());
    }

    #[test]
    fn inverted_window_is_invalid() {
        let now = Utc::now();
        let claims = IdentityClaims {
            issued_at: now,
            expires_at: now - Duration::minutes(1),
            ..IdentityClaims::default()
        };
        assert!(!has_valid_window(&claims, now));
    }

    #[test]
    fn future_issue_instant_is_invalid() {
        let now = Utc::now();
        let claims = IdentityClaims {
            issued_at: now + Duration::minutes(10),
            expires_at: now + Duration::minutes(70),
            ..IdentityClaims::default()
        };
        assert!(!has_valid_window(&claims, now));
        assert!(has_valid_window(&claims, now + Duration::minutes(10)));
    }

    #[test]
    fn timestamps_serialize_as_numeric_dates() {
        let claims = IdentityClaims {
            issued_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            expires_at: DateTime::from_timestamp(1_700_003_600, 0).unwrap(),
            ..IdentityClaims::default()
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["iat"], 1_700_000_000);
        assert_eq!(json["exp"], 1_700_003_600);
    }

    proptest! {
        #[test]
        fn role_check_matches_set_intersection(
            held in proptest::collection::vec("[a-c]{1,2}", 0..6),
            allowed in proptest::collection::vec("[a-c]{1,2}", 0..6),
        ) {
            let claims = IdentityClaims {
                roles: held.iter().cloned().map(RoleName::from).collect(),
                ..IdentityClaims::default()
            };
            let allowed_roles: Vec<RoleName> = allowed.iter().cloned().map(RoleName::from).collect();
            let expected = held.iter().any(|h| allowed.contains(h));
            prop_assert_eq!(claims.has_any_role(&allowed_roles), expected);
        }
    }
}
