//! Backend service clients.
//!
//! # Module Organization
//!
//! ```text
//! client/
//! ├── service - ServiceClient: session check, auth headers, retry, classification
//! ├── auth    - AuthClient: login, logout revocation, permission loading
//! └── headers - header and URL helpers
//! ```
//!
//! # Examples
//!
//! ```ignore
//! let ctx = Arc::new(ClientContext::new(http, base_url, session, classifier));
//! let notifications = ServiceClient::notification(ctx);
//! let unread: Option<serde_json::Value> = notifications.get("/api/notifications/unread").await?;
//! ```

mod auth;
mod headers;
mod service;

pub use auth::AuthClient;
pub use headers::{auth_headers, service_url, INDEX_HEADER};
pub use service::{
    ClientContext, RequestOptions, ServiceClient, ADMIN_READ_SERVICE, ADMIN_SERVICE, MEDIA_SERVICE,
    NOTIFICATION_SERVICE, SCHOOL_READ_SERVICE, SCHOOL_WRITE_SERVICE, SUPPORT_TICKET_SERVICE,
};

use std::time::Duration;

use crate::config::TimeoutConfig;

/// reqwest client with the configured connect and request timeouts.
pub fn build_http_client(timeouts: &TimeoutConfig) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .timeout(Duration::from_secs(timeouts.request_secs))
        .build()
}
