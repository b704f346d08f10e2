//! Transport-level GET response cache
//!
//! Caches full 200 response bodies keyed by the exact request URL for a
//! fixed TTL. Independent of the tag cache and invalidated only by
//! time, so mutations leave a bounded staleness window on GETs that
//! were cached before the write.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::http::{header, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory response cache keyed by hashed request URL
pub struct ResponseCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, (Bytes, Instant)>>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Cache key for a request URL
    pub fn key_for(url: &str) -> String {
        format!("api_{}", hex::encode(Sha256::digest(url.as_bytes())))
    }

    pub async fn get(&self, key: &str) -> Option<Bytes> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|(_, stored_at)| stored_at.elapsed() < self.ttl)
            .map(|(body, _)| body.clone())
    }

    pub async fn put(&self, key: String, body: Bytes) {
        let mut entries = self.entries.write().await;
        entries.insert(key, (body, Instant::now()));
    }
}

/// Middleware caching 200 GET responses by full URL
pub async fn cache_get_responses(
    State(cache): State<Arc<ResponseCache>>,
    req: Request,
    next: Next,
) -> Response {
    if req.method() != Method::GET {
        return next.run(req).await;
    }

    let key = ResponseCache::key_for(&req.uri().to_string());
    if let Some(body) = cache.get(&key).await {
        debug!(%key, "serving GET response from cache");
        return ([(header::CONTENT_TYPE, "application/json")], body).into_response();
    }

    let response = next.run(req).await;
    if response.status() != StatusCode::OK {
        return response;
    }

    let (parts, body) = response.into_parts();
    match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => {
            cache.put(key, bytes.clone()).await;
            Response::from_parts(parts, Body::from(bytes))
        }
        // The body is gone at this point, so there is nothing left to
        // serve; the handler itself already succeeded.
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}
