//! Postgres-backed event log.
//!
//! One row per consumed envelope in `event_log`; originator and payload are
//! stored as `jsonb`. There is deliberately no unique constraint on
//! `event_id`: redelivered envelopes produce additional rows.
//!
//! ## Error Mapping
//!
//! Every SQLx error maps to `RecordError::Storage` with the failing operation
//! in the message; the consumer logs it and moves on.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::{Span, instrument};

use cellcentre_events::{EventRecordRepository, EventType, RecordError, StoredEventRecord};

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS event_log (
    id              BIGSERIAL PRIMARY KEY,
    event_id        UUID        NOT NULL,
    channel         TEXT        NOT NULL,
    event_type      TEXT        NOT NULL,
    aggregate_id    TEXT        NOT NULL,
    aggregate_type  TEXT        NOT NULL,
    originator      JSONB       NOT NULL,
    data            JSONB       NOT NULL,
    created_at      TIMESTAMPTZ NOT NULL,
    recorded_at     TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const CREATE_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS event_log_aggregate_idx
    ON event_log (aggregate_type, aggregate_id, id)
"#;

#[derive(Debug, Clone)]
pub struct PostgresEventLog {
    pool: Arc<PgPool>,
}

impl PostgresEventLog {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub async fn connect(database_url: &str) -> Result<Self, RecordError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the table and index if missing (idempotent).
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), RecordError> {
        sqlx::query(CREATE_TABLE)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("create_table", e))?;
        sqlx::query(CREATE_INDEX)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("create_index", e))?;
        Ok(())
    }
}

#[async_trait]
impl EventRecordRepository for PostgresEventLog {
    #[instrument(
        skip(self, record),
        fields(
            event_id = %record.event_id,
            aggregate_id = %record.aggregate_id,
            event_type = %record.event_type
        ),
        err
    )]
    async fn append(&self, record: StoredEventRecord) -> Result<(), RecordError> {
        let originator = serde_json::to_value(&record.originator)
            .map_err(|e| RecordError::Storage(format!("originator serialization failed: {e}")))?;
        let data = serde_json::to_value(&record.data)
            .map_err(|e| RecordError::Storage(format!("payload serialization failed: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO event_log (
                event_id,
                channel,
                event_type,
                aggregate_id,
                aggregate_type,
                originator,
                data,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.event_id)
        .bind(&record.channel)
        .bind(record.event_type.as_str())
        .bind(&record.aggregate_id)
        .bind(&record.aggregate_type)
        .bind(originator)
        .bind(data)
        .bind(record.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_event", e))?;

        Ok(())
    }

    #[instrument(skip(self), fields(record_count = tracing::field::Empty), err)]
    async fn list_for_aggregate(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
    ) -> Result<Vec<StoredEventRecord>, RecordError> {
        let rows = sqlx::query(
            r#"
            SELECT
                event_id,
                channel,
                event_type,
                aggregate_id,
                aggregate_type,
                originator,
                data,
                created_at
            FROM event_log
            WHERE aggregate_type = $1 AND aggregate_id = $2
            ORDER BY id ASC
            "#,
        )
        .bind(aggregate_type)
        .bind(aggregate_id)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_for_aggregate", e))?;

        let records = rows
            .iter()
            .map(record_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Span::current().record("record_count", records.len());
        Ok(records)
    }
}

fn record_from_row(row: &sqlx::postgres::PgRow) -> Result<StoredEventRecord, RecordError> {
    let read = |e: sqlx::Error| map_sqlx_error("decode_row", e);
    let event_type: String = row.try_get("event_type").map_err(read)?;
    let originator: serde_json::Value = row.try_get("originator").map_err(read)?;
    let data: serde_json::Value = row.try_get("data").map_err(read)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(read)?;

    Ok(StoredEventRecord {
        event_id: row.try_get("event_id").map_err(read)?,
        channel: row.try_get("channel").map_err(read)?,
        event_type: parse_event_type(&event_type)?,
        aggregate_id: row.try_get("aggregate_id").map_err(read)?,
        aggregate_type: row.try_get("aggregate_type").map_err(read)?,
        originator: serde_json::from_value(originator)
            .map_err(|e| RecordError::Storage(format!("bad originator column: {e}")))?,
        data: serde_json::from_value(data)
            .map_err(|e| RecordError::Storage(format!("bad data column: {e}")))?,
        created_at,
    })
}

fn parse_event_type(raw: &str) -> Result<EventType, RecordError> {
    match raw {
        "NewEntity" => Ok(EventType::NewEntity),
        "UpdateEntity" => Ok(EventType::UpdateEntity),
        "DeleteEntity" => Ok(EventType::DeleteEntity),
        other => Err(RecordError::Storage(format!("unknown event type {other}"))),
    }
}

/// Map SQLx errors to RecordError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> RecordError {
    match err {
        sqlx::Error::Database(db_err) => {
            RecordError::Storage(format!("database error in {}: {}", operation, db_err.message()))
        }
        sqlx::Error::PoolClosed => {
            RecordError::Storage(format!("connection pool closed in {}", operation))
        }
        _ => RecordError::Storage(format!("sqlx error in {}: {}", operation, err)),
    }
}
