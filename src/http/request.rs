//! Request identification.
//!
//! # Design Decisions
//! - An incoming `x-request-id` is kept; otherwise a UUID v4 is generated
//! - The ID is set before tracing so every log line of the request carries it
//! - The same ID is forwarded upstream and echoed on the response

use axum::http::HeaderMap;

pub const X_REQUEST_ID: &str = "x-request-id";

/// The request's ID, or `"unknown"` when none was set.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}
