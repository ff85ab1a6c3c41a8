use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use cellcentre_auth::IdentityClaims;
use cellcentre_employees::{Employee, EmployeeFilter, EmployeeSnapshot, UpdateEmployeeRequest};

use crate::{EventData, EventEnvelope, EventType, Originator};

/// Channel (and aggregate type) of employee events.
pub const EMPLOYEES_CHANNEL: &str = "employees";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("delete filter carries neither id nor email")]
    MissingAggregateId,
}

/// Builds envelopes for one channel/aggregate type.
///
/// Every call draws a fresh random event id; the originator always comes from
/// the verified claims passed in.
#[derive(Debug, Clone)]
pub struct EventFactory {
    channel: String,
    aggregate_type: String,
}

impl EventFactory {
    pub fn new(channel: impl Into<String>, aggregate_type: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            aggregate_type: aggregate_type.into(),
        }
    }

    pub fn employees() -> Self {
        Self::new(EMPLOYEES_CHANNEL, EMPLOYEES_CHANNEL)
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn new_entity(&self, claims: &IdentityClaims, employee: &Employee) -> EventEnvelope {
        self.envelope(
            claims,
            EventType::NewEntity,
            employee.id.to_string(),
            EventData::Employee(EmployeeSnapshot::from(employee)),
        )
    }

    /// The request is redacted before it is embedded.
    pub fn update_entity(
        &self,
        claims: &IdentityClaims,
        request: &UpdateEmployeeRequest,
    ) -> EventEnvelope {
        self.envelope(
            claims,
            EventType::UpdateEntity,
            request.id.to_string(),
            EventData::UpdateRequest(request.redacted()),
        )
    }

    /// Aggregate id is the filter id when present, else the email.
    pub fn delete_entity(
        &self,
        claims: &IdentityClaims,
        filter: &EmployeeFilter,
    ) -> Result<EventEnvelope, EnvelopeError> {
        let aggregate_id = match (&filter.id, filter.email.as_deref()) {
            (Some(id), _) => id.to_string(),
            (None, Some(email)) if !email.is_empty() => email.to_string(),
            _ => return Err(EnvelopeError::MissingAggregateId),
        };
        Ok(self.envelope(
            claims,
            EventType::DeleteEntity,
            aggregate_id,
            EventData::EmployeeFilter(filter.clone()),
        ))
    }

    fn envelope(
        &self,
        claims: &IdentityClaims,
        event_type: EventType,
        aggregate_id: String,
        data: EventData,
    ) -> EventEnvelope {
        EventEnvelope::new(
            Uuid::new_v4(),
            self.channel.clone(),
            event_type,
            aggregate_id,
            self.aggregate_type.clone(),
            Originator::from(claims),
            data,
            Utc::now(),
        )
    }
}
