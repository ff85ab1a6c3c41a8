use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use cellcentre_employees::EmployeeSnapshot;

use crate::{EventData, EventEnvelope, EventType, Originator};

/// Queryable projection of a consumed envelope.
///
/// Same metadata as the envelope; the tagged payload is resolved into a
/// uniformly typed [`EmployeeSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEventRecord {
    pub event_id: Uuid,
    pub channel: String,
    pub event_type: EventType,
    pub aggregate_id: String,
    pub aggregate_type: String,
    pub originator: Originator,
    pub data: EmployeeSnapshot,
    pub created_at: DateTime<Utc>,
}

impl From<EventEnvelope> for StoredEventRecord {
    fn from(envelope: EventEnvelope) -> Self {
        let event_id = envelope.event_id();
        let channel = envelope.channel().to_string();
        let event_type = envelope.event_type();
        let aggregate_id = envelope.aggregate_id().to_string();
        let aggregate_type = envelope.aggregate_type().to_string();
        let originator = envelope.originator().clone();
        let created_at = envelope.created_at();

        let data = match envelope.into_data() {
            EventData::Employee(snapshot) => snapshot,
            EventData::UpdateRequest(request) => EmployeeSnapshot::from(&request),
            EventData::EmployeeFilter(filter) => EmployeeSnapshot::from(&filter),
        };

        Self {
            event_id,
            channel,
            event_type,
            aggregate_id,
            aggregate_type,
            originator,
            data,
            created_at,
        }
    }
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("event log storage failure: {0}")]
    Storage(String),
}

/// Append-only event log. No update-in-place, no uniqueness on `event_id`.
#[async_trait]
pub trait EventRecordRepository: Send + Sync {
    async fn append(&self, record: StoredEventRecord) -> Result<(), RecordError>;

    /// Records of one aggregate, oldest first.
    async fn list_for_aggregate(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
    ) -> Result<Vec<StoredEventRecord>, RecordError>;
}

#[async_trait]
impl<S> EventRecordRepository for Arc<S>
where
    S: EventRecordRepository + ?Sized,
{
    async fn append(&self, record: StoredEventRecord) -> Result<(), RecordError> {
        (**self).append(record).await
    }

    async fn list_for_aggregate(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
    ) -> Result<Vec<StoredEventRecord>, RecordError> {
        (**self).list_for_aggregate(aggregate_type, aggregate_id).await
    }
}
