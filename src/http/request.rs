//! Request identification and decoding.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4) and propagate it on the response
//! - Decode the request body into trigger content
//! - Collect query parameters into the attribute bag shape
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Empty body is not an error: content becomes `null`
//! - Repeated query keys are joined with `,` in arrival order

use std::collections::BTreeMap;

use axum::http::{HeaderMap, HeaderName, HeaderValue, Request};
use serde_json::Value;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Generates a fresh UUID v4 request ID.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Request ID set by the request-id layer, or `"unknown"`.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Decode a JSON body; blank bodies decode to `null`.
pub fn decode_content(body: &[u8]) -> Result<Value, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body)
}

/// Collapse query pairs into one value per key.
pub fn join_query(pairs: Vec<(String, String)>) -> BTreeMap<String, String> {
    let mut joined: BTreeMap<String, String> = BTreeMap::new();
    for (key, value) in pairs {
        joined
            .entry(key)
            .and_modify(|existing| {
                existing.push(',');
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    joined
}
