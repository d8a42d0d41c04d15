//! HTTP handlers for the six routes named in spec §6. Grounded on the
//! upstream `api/routes/health.rs` handler idiom
//! (`async fn handler(State(..)) -> impl IntoResponse`, returning
//! `(StatusCode, Json<T>)`).

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use rand::RngCore;
use serde_json::json;

use writeshed_core::constants::{
    CACHE_CLEAR_PATTERN, CACHE_KEY_PREFIX, READS_PER_REQUEST, STREAM_MAXLEN_APPROX, STREAM_NAME,
    WRITES_PER_REQUEST, WRITE_DOC_TYPE, WRITE_PAYLOAD_BYTES,
};
use writeshed_core::{Broker, BrokerStats, WriteDoc};

use crate::app::AppState;

fn cache_key(doc_type: &str) -> String {
    format!("{CACHE_KEY_PREFIX}{doc_type}")
}

pub async fn healthz() -> impl IntoResponse {
    Json(json!({ "status": "ok", "ts": Utc::now() }))
}

pub async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (redis_ok, mongo_ok) = tokio::join!(
        state.broker.health_check(),
        state.store.health_check(),
    );

    let redis = if redis_ok.is_ok() { "connected" } else { "disconnected" };
    let mongo = if mongo_ok.is_ok() { "connected" } else { "disconnected" };

    if redis_ok.is_ok() && mongo_ok.is_ok() {
        (
            StatusCode::OK,
            Json(json!({ "status": "ready", "mongo": mongo, "redis": redis, "ts": Utc::now() })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "not ready", "mongo": mongo, "redis": redis, "ts": Utc::now() })),
        )
    }
}

/// `GET /api/data`: performs `WRITES_PER_REQUEST` stream appends and
/// `READS_PER_REQUEST` cache-aside reads. See spec §4.1.
pub async fn api_data(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    // Broker unreachable at request start fails the whole request: the
    // write path needs the stream, and the stream needs the broker.
    if state.broker.health_check().await.is_err() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "error", "message": "broker unreachable" })),
        )
            .into_response();
    }

    let mut writes = Vec::with_capacity(WRITES_PER_REQUEST);
    for index in 0..WRITES_PER_REQUEST {
        let mut payload = vec![0u8; WRITE_PAYLOAD_BYTES];
        rand::thread_rng().fill_bytes(&mut payload);
        let doc = WriteDoc::new(index, payload);

        let data = match serde_json::to_vec(&doc) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize write doc");
                continue;
            }
        };

        match state.broker.append(STREAM_NAME, &data, STREAM_MAXLEN_APPROX).await {
            Ok(id) => writes.push(id),
            Err(e) => {
                tracing::warn!(error = %e, "broker append failed");
                return (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({ "status": "error", "message": "broker append failed" })),
                )
                    .into_response();
            }
        }
    }

    let mut reads = Vec::with_capacity(READS_PER_REQUEST);
    let key = cache_key(WRITE_DOC_TYPE);
    for _ in 0..READS_PER_REQUEST {
        match state.broker.get(&key).await {
            Ok(Some(_cached)) => reads.push("cache-hit".to_string()),
            // A cache miss falls through to the store; a broker error on
            // the cache lookup itself fails the whole request, since the
            // broker is not a degradable dependency (spec §4.1 guarantees).
            Ok(None) => match state.store.find_one_by_type(WRITE_DOC_TYPE).await {
                Ok(Some((id, doc))) => {
                    if let Ok(bytes) = serde_json::to_vec(&doc) {
                        if let Err(e) = state.broker.setex(&key, state.config.cache_ttl(), &bytes).await {
                            tracing::warn!(error = %e, "cache populate failed");
                        }
                    }
                    reads.push(id);
                }
                // A store failure during read fallback degrades to a miss
                // slot rather than failing the whole request.
                Ok(None) | Err(_) => reads.push("miss".to_string()),
            },
            Err(e) => {
                tracing::warn!(error = %e, "broker cache lookup failed");
                return (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({ "status": "error", "message": "broker unreachable" })),
                )
                    .into_response();
            }
        }
    }

    (
        StatusCode::OK,
        Json(json!({ "status": "success", "reads": reads, "writes": writes, "ts": Utc::now() })),
    )
        .into_response()
}

pub async fn api_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let count = state.store.count().await;
    let stream_len = state.broker.len(STREAM_NAME).await;

    match (count, stream_len) {
        (Ok(total_documents), Ok(pending_writes_in_stream)) => (
            StatusCode::OK,
            Json(json!({
                "total_documents": total_documents,
                "pending_writes_in_stream": pending_writes_in_stream,
                "ts": Utc::now(),
            })),
        )
            .into_response(),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "status": "error", "message": "failed to gather stats" })),
        )
            .into_response(),
    }
}

pub async fn cache_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let stream_len = match state.broker.len(STREAM_NAME).await {
        Ok(n) => n,
        Err(_) => {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "error", "message": "broker unreachable" })),
            )
                .into_response()
        }
    };

    let pending = state
        .broker
        .pending_range(writeshed_core::constants::CONSUMER_GROUP, STREAM_NAME, 1000)
        .await
        .unwrap_or_default();

    let mut consumers = std::collections::HashSet::new();
    for entry in &pending {
        consumers.insert(entry.consumer.clone());
    }

    (
        StatusCode::OK,
        Json(json!({
            "stats": BrokerStats {
                stream_len,
                pending_count: pending.len() as u64,
                consumer_count: consumers.len() as u64,
            },
            "ts": Utc::now(),
        })),
    )
        .into_response()
}

/// `POST /api/cache/clear`: deletes only `doc:*`-scoped keys. The stream
/// key is never touched by this operation, per spec §4.4.
pub async fn cache_clear(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let keys = match state.broker.keys(CACHE_CLEAR_PATTERN).await {
        Ok(keys) => keys,
        Err(_) => {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "error", "message": "broker unreachable" })),
            )
                .into_response()
        }
    };

    match state.broker.del(&keys).await {
        Ok(keys_removed) => (
            StatusCode::OK,
            Json(json!({ "status": "cleared", "keys_removed": keys_removed })),
        )
            .into_response(),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "error", "message": "broker unreachable" })),
        )
            .into_response(),
    }
}

pub async fn handle_404() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "status": "error", "message": "not found" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_is_prefixed_with_doc_colon() {
        assert_eq!(cache_key("write"), "doc:write");
    }

    #[test]
    fn cache_key_matches_the_broker_clear_glob() {
        // `/api/cache/clear` deletes `doc:*`; every key this module ever
        // writes must fall under that glob, or a clear call would leak
        // stale cache entries.
        let key = cache_key(WRITE_DOC_TYPE);
        let prefix = CACHE_CLEAR_PATTERN.trim_end_matches('*');
        assert!(key.starts_with(prefix));
    }
}
