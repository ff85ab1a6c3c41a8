use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cellcentre_auth::IdentityClaims;
use cellcentre_core::EntityId;
use cellcentre_employees::{EmployeeFilter, EmployeeSnapshot, UpdateEmployeeRequest};

/// Kind of mutation an envelope records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    NewEntity,
    UpdateEntity,
    DeleteEntity,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::NewEntity => "NewEntity",
            EventType::UpdateEntity => "UpdateEntity",
            EventType::DeleteEntity => "DeleteEntity",
        }
    }
}

impl core::fmt::Display for EventType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who performed the mutation. Always copied from verified claims.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Originator {
    pub entity_id: EntityId,
    pub entity: String,
    pub login: String,
}

impl From<&IdentityClaims> for Originator {
    fn from(claims: &IdentityClaims) -> Self {
        Self {
            entity_id: claims.entity_id,
            entity: claims.entity.clone(),
            login: claims.login.clone(),
        }
    }
}

/// Envelope payload; exactly one case is populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum EventData {
    Employee(EmployeeSnapshot),
    UpdateRequest(UpdateEmployeeRequest),
    EmployeeFilter(EmployeeFilter),
}

/// Canonical, immutable record of one accepted mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    event_id: Uuid,
    channel: String,
    #[serde(rename = "type")]
    event_type: EventType,
    aggregate_id: String,
    aggregate_type: String,
    originator: Originator,
    data: EventData,
    created_at: DateTime<Utc>,
}

impl EventEnvelope {
    pub fn new(
        event_id: Uuid,
        channel: impl Into<String>,
        event_type: EventType,
        aggregate_id: impl Into<String>,
        aggregate_type: impl Into<String>,
        originator: Originator,
        data: EventData,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id,
            channel: channel.into(),
            event_type,
            aggregate_id: aggregate_id.into(),
            aggregate_type: aggregate_type.into(),
            originator,
            data,
            created_at,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub fn aggregate_id(&self) -> &str {
        &self.aggregate_id
    }

    pub fn aggregate_type(&self) -> &str {
        &self.aggregate_type
    }

    pub fn originator(&self) -> &Originator {
        &self.originator
    }

    pub fn data(&self) -> &EventData {
        &self.data
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn into_data(self) -> EventData {
        self.data
    }

    /// Same envelope, stamped with the time the mutation was accepted.
    pub(crate) fn stamped_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}
