//! Response handling and transformation.
//!
//! # Design Decisions
//! - Hop-by-hop headers are stripped in both directions
//! - Gateway-generated errors are JSON so dashboard code can parse them

use axum::http::{header::CONNECTION, HeaderMap, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Headers that apply to a single connection and must not be forwarded.
pub const HOP_BY_HOP: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Remove hop-by-hop headers, including any named in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

/// `{"statusCode": code, "message": message, "requestId": id}`, the same
/// shape the dashboard stores in its error slot.
pub fn error_response(status: StatusCode, message: &str, request_id: &str) -> Response {
    let body = json!({
        "statusCode": status.as_u16(),
        "message": message,
        "requestId": request_id,
    });
    (status, Json(body)).into_response()
}
