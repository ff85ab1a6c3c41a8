use std::sync::RwLock;

use async_trait::async_trait;

use cellcentre_events::{EventRecordRepository, RecordError, StoredEventRecord};

/// In-memory event log for tests/dev.
///
/// - Append-only
/// - No deduplication on `event_id`
#[derive(Debug, Default)]
pub struct InMemoryEventLog {
    records: RwLock<Vec<StoredEventRecord>>,
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything appended so far, in append order.
    pub fn all(&self) -> Vec<StoredEventRecord> {
        self.records
            .read()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl EventRecordRepository for InMemoryEventLog {
    async fn append(&self, record: StoredEventRecord) -> Result<(), RecordError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| RecordError::Storage("event log lock poisoned".to_string()))?;
        records.push(record);
        Ok(())
    }

    async fn list_for_aggregate(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
    ) -> Result<Vec<StoredEventRecord>, RecordError> {
        let records = self
            .records
            .read()
            .map_err(|_| RecordError::Storage("event log lock poisoned".to_string()))?;
        Ok(records
            .iter()
            .filter(|r| r.aggregate_type == aggregate_type && r.aggregate_id == aggregate_id)
            .cloned()
            .collect())
    }
}
