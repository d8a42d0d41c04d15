//! Shared domain types: stream entries, pending-entries-list records, and
//! the document shape written by the ingress and read back by the consumer.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A document as appended to the stream and ultimately committed to the
/// document store. Field names match the wire shape in spec §4.1
/// (`{type, index, payload, ts}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteDoc {
    #[serde(rename = "type")]
    pub doc_type: String,
    pub index: usize,
    /// Opaque payload, base64-encoded so it round-trips through JSON
    /// cleanly regardless of the bytes it was generated from.
    pub payload: String,
    pub ts: DateTime<Utc>,
}

impl WriteDoc {
    pub fn new(index: usize, payload: Vec<u8>) -> Self {
        use base64::Engine as _;
        Self {
            doc_type: crate::constants::WRITE_DOC_TYPE.to_string(),
            index,
            payload: base64::engine::general_purpose::STANDARD.encode(payload),
            ts: Utc::now(),
        }
    }
}

/// A raw entry read from the broker's stream, before payload decoding.
/// Kept as bytes because a malformed payload must still be tracked for
/// acknowledgement (poison-pill handling, spec §4.3).
#[derive(Debug, Clone)]
pub struct StreamEntry {
    pub id: String,
    pub data: Vec<u8>,
}

/// One record from the consumer group's pending-entries list.
#[derive(Debug, Clone)]
pub struct PendingEntry {
    pub id: String,
    pub consumer: String,
    pub idle: Duration,
    pub delivery_count: u64,
}

/// Aggregate broker-side observability numbers, used by `/api/cache/stats`.
#[derive(Debug, Clone, Serialize)]
pub struct BrokerStats {
    pub stream_len: u64,
    pub pending_count: u64,
    pub consumer_count: u64,
}
