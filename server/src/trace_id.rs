//! Per-request trace id.
//!
//! Callers may pass a `Trace-Id` header to correlate their logs with ours; if
//! they don't, one is generated. The id is stored as a request extension (so
//! the request span can record it) and echoed back on the response.

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};

pub const TRACE_ID_HEADER: &str = "trace-id";

/// Longest caller-supplied id we accept before generating our own.
const MAX_TRACE_ID_LEN: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceId(pub String);

impl TraceId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    fn from_request(request: &Request<Body>) -> Option<Self> {
        request
            .headers()
            .get(TRACE_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty() && s.len() <= MAX_TRACE_ID_LEN)
            .map(|s| Self(s.to_string()))
    }
}

/// Must be layered outside the TraceLayer so the id exists when the request
/// span is created.
pub async fn trace_id_middleware(mut request: Request<Body>, next: Next) -> Response {
    let trace_id = TraceId::from_request(&request).unwrap_or_else(TraceId::generate);
    request.extensions_mut().insert(trace_id.clone());

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&trace_id.0) {
        response.headers_mut().insert(TRACE_ID_HEADER, value);
    }
    response
}
