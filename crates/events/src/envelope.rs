use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope for a published event, carrying stream metadata.
///
/// - `aggregate_version` is the version the aggregate reached with the write
///   that produced this event; consumers can use it to drop stale deliveries.
/// - `payload` is the typed domain event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,

    aggregate_id: Uuid,
    aggregate_type: String,
    aggregate_version: u64,

    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(
        aggregate_id: Uuid,
        aggregate_type: impl Into<String>,
        aggregate_version: u64,
        payload: E,
    ) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            aggregate_id,
            aggregate_type: aggregate_type.into(),
            aggregate_version,
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn aggregate_id(&self) -> Uuid {
        self.aggregate_id
    }

    pub fn aggregate_type(&self) -> &str {
        &self.aggregate_type
    }

    pub fn aggregate_version(&self) -> u64 {
        self.aggregate_version
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}
