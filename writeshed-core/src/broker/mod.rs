//! The broker contract: an external system providing a Redis-Streams-shaped
//! append-only log (with a consumer-group PEL) and a key/value facet used
//! for cache-aside reads. Generalized from the upstream `TopicBackend` +
//! `CacheBackend` split, unified into one trait because both facets live
//! behind the same Redis connection pool in this system.

pub mod redis;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::BrokerError;
use crate::model::{PendingEntry, StreamEntry};

pub use redis::RedisBroker;

/// Operations the ingress and consumer need from the broker. See spec §4.2.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Append `data` to `stream`, trimming to approximately `maxlen_approx`
    /// entries. Returns the broker-assigned entry id.
    async fn append(&self, stream: &str, data: &[u8], maxlen_approx: u64) -> Result<String, BrokerError>;

    /// Idempotently ensure `group` exists on `stream`, creating the stream
    /// if absent. An "already exists" error from the broker is not an
    /// error here.
    async fn group_create(&self, stream: &str, group: &str, start_id: &str) -> Result<(), BrokerError>;

    /// Read up to `count` new entries (`>`) for `consumer` within `group`,
    /// blocking up to `block` for at least one entry.
    async fn read_group(
        &self,
        group: &str,
        consumer: &str,
        stream: &str,
        count: usize,
        block: Duration,
    ) -> Result<Vec<StreamEntry>, BrokerError>;

    /// Enumerate up to `count` entries from the group's pending-entries
    /// list, across all consumers.
    async fn pending_range(&self, group: &str, stream: &str, count: usize) -> Result<Vec<PendingEntry>, BrokerError>;

    /// Transfer ownership of `ids` to `new_consumer` if they have been
    /// idle at least `min_idle`, returning the claimed entries (which
    /// retain their original id).
    async fn claim(
        &self,
        group: &str,
        stream: &str,
        new_consumer: &str,
        min_idle: Duration,
        ids: &[String],
    ) -> Result<Vec<StreamEntry>, BrokerError>;

    /// Acknowledge `ids`, removing them from the group's PEL. Returns the
    /// number actually acknowledged.
    async fn ack(&self, group: &str, stream: &str, ids: &[String]) -> Result<u64, BrokerError>;

    /// Current (approximate) length of `stream`.
    async fn len(&self, stream: &str) -> Result<u64, BrokerError>;

    /// Key/value facet: point lookup.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BrokerError>;

    /// Key/value facet: set with a millisecond-precision TTL.
    async fn setex(&self, key: &str, ttl: Duration, value: &[u8]) -> Result<(), BrokerError>;

    /// Key/value facet: enumerate keys matching a glob pattern.
    async fn keys(&self, pattern: &str) -> Result<Vec<String>, BrokerError>;

    /// Key/value facet: delete the given keys, returning the count removed.
    async fn del(&self, keys: &[String]) -> Result<u64, BrokerError>;

    /// Cheap reachability probe used by `/readyz`.
    async fn health_check(&self) -> Result<(), BrokerError>;
}
