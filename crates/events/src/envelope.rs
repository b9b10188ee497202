use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where an inbound event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    /// The chat transport forwarding a user request.
    Messaging,
    /// The processing backend's completion webhook.
    ProcessingBackend,
}

impl EventSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventSource::Messaging => "messaging",
            EventSource::ProcessingBackend => "processing_backend",
        }
    }
}

/// Envelope for one inbound delivery.
///
/// Notes:
/// - `delivery_id` identifies this delivery, not the job; duplicates of the
///   same callback get distinct delivery ids.
/// - `received_at` is stamped on arrival and only used for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<E> {
    delivery_id: Uuid,
    source: EventSource,
    received_at: DateTime<Utc>,
    payload: E,
}

impl<E> Envelope<E> {
    pub fn new(delivery_id: Uuid, source: EventSource, received_at: DateTime<Utc>, payload: E) -> Self {
        Self {
            delivery_id,
            source,
            received_at,
            payload,
        }
    }

    /// Stamp a payload that has just arrived.
    pub fn received(source: EventSource, payload: E) -> Self {
        Self::new(Uuid::now_v7(), source, Utc::now(), payload)
    }

    pub fn delivery_id(&self) -> Uuid {
        self.delivery_id
    }

    pub fn source(&self) -> EventSource {
        self.source
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }
}
