//! Response cache middleware.
//!
//! Caches successful GET responses of public routes and serves them until
//! their freshness window passes or a revalidation drops them.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Method, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, instrument, warn};

use super::{
    CacheConfig, deps,
    keys::ResponseKey,
    store::{CachedResponse, ResponseStore},
};

const MAX_CACHED_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Shared cache state for middleware.
#[derive(Clone)]
pub struct CacheState {
    pub config: CacheConfig,
    pub responses: Arc<ResponseStore>,
}

/// Middleware for response caching.
///
/// Only GET requests answered with 200 OK are stored. Document tags recorded
/// by the handler are attached to the entry for tag invalidation.
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn response_cache_layer(
    State(cache): State<CacheState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !cache.config.enable_response_cache || request.method() != Method::GET {
        return next.run(request).await;
    }

    let key = ResponseKey::new(
        request.uri().path(),
        request.uri().query().unwrap_or_default(),
    );

    if let Some(cached) = cache.responses.get(&key) {
        debug!(cache = "response", outcome = "hit", "serving cached response");
        return build_response(cached);
    }

    debug!(
        cache = "response",
        outcome = "miss",
        "cache miss, executing handler"
    );

    let (response, deps) = deps::with_collector(next.run(request)).await;

    if !should_store(&response) {
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_CACHED_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(error) => {
            warn!(%error, "failed to buffer response body for caching");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let cached = CachedResponse {
        status: parts.status.as_u16(),
        headers: parts
            .headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.to_string(), value.to_string()))
            })
            .collect(),
        body: bytes.clone(),
    };

    debug!(cache = "response", deps_count = deps.len(), "caching response");
    cache.responses.set(key, cached, deps);

    Response::from_parts(parts, Body::from(bytes))
}

/// 200 responses that did not opt out with `Cache-Control: no-store`.
fn should_store(response: &Response) -> bool {
    if response.status() != StatusCode::OK {
        return false;
    }

    !response
        .headers()
        .get(header::CACHE_CONTROL)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("no-store"))
}

fn build_response(cached: CachedResponse) -> Response {
    let mut builder = Response::builder().status(cached.status);

    for (name, value) in cached.headers {
        if let Ok(header_value) = HeaderValue::from_str(&value) {
            builder = builder.header(name, header_value);
        }
    }

    builder
        .body(Body::from(cached.body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
