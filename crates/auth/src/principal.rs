use cellcentre_core::EntityId;

use crate::RoleName;

/// Capability of an entity that can log in and be issued identity claims.
///
/// Implemented per concrete entity type (employees today); the token service
/// only ever sees this view of it.
pub trait ClaimsSource {
    /// Kind tag of the entity (e.g. "employee").
    fn entity_kind(&self) -> &str;

    fn entity_id(&self) -> EntityId;

    /// Login string (unique per entity kind).
    fn login(&self) -> &str;

    /// Role names in the entity's own order; duplicates are kept as-is.
    fn role_names(&self) -> Vec<RoleName>;
}
