//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from TOML files.

use serde::{Deserialize, Serialize};

use crate::resilience::classify::ClassifyMode;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Service routes mapping logical prefixes to backend hosts.
    pub services: Vec<ServiceRoute>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Retry configuration for service clients.
    pub retries: RetryConfig,

    /// Failure classifier settings.
    pub classifier: ClassifierConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Request limits.
    pub security: SecurityConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            services: default_services(),
            timeouts: TimeoutConfig::default(),
            retries: RetryConfig::default(),
            classifier: ClassifierConfig::default(),
            observability: ObservabilityConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Look up a service route by name or prefix.
    pub fn service(&self, key: &str) -> Option<&ServiceRoute> {
        self.services
            .iter()
            .find(|s| s.name == key || s.prefix == key)
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// A proxied backend service.
///
/// Requests under `prefix` are forwarded to `upstream` with the prefix
/// removed: `/notification_service/api/x` → `{upstream}/api/x`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServiceRoute {
    /// Service identifier for logging/metrics.
    pub name: String,

    /// Logical path prefix (e.g., "/admin_service").
    pub prefix: String,

    /// Backend base URL (e.g., "http://172.16.68.4:8081").
    pub upstream: String,
}

impl ServiceRoute {
    pub fn new(name: &str, prefix: &str, upstream: &str) -> Self {
        Self {
            name: name.to_string(),
            prefix: prefix.to_string(),
            upstream: upstream.to_string(),
        }
    }
}

/// Route table shipped with the dashboard deployment.
pub fn default_services() -> Vec<ServiceRoute> {
    vec![
        ServiceRoute::new("admin", "/admin_service", "http://172.16.68.4:8081"),
        ServiceRoute::new("admin-read", "/admin_read_service", "http://172.16.68.6:8086"),
        ServiceRoute::new("school-read", "/school_read_service", "http://172.16.68.6:8087"),
        ServiceRoute::new("school-write", "/school-write-backend", "http://172.16.68.6:8082"),
        ServiceRoute::new("media", "/media_service", "http://172.16.68.10:8088"),
        ServiceRoute::new("support-ticket", "/support_ticket_service", "http://172.16.68.10:8089"),
        ServiceRoute::new("notification", "/notification_service", "http://172.16.68.10:8085"),
    ]
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Retry configuration for service clients.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Enable retries. When false every call is attempted once.
    pub enabled: bool,

    /// Total attempts per call (0 and 1 both mean a single attempt).
    pub max_attempts: u32,

    /// Fixed delay between attempts in milliseconds.
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 2,
            delay_ms: 1000,
        }
    }
}

/// Failure classifier configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Fire on every failed attempt or only on the final outcome.
    pub mode: ClassifyMode,

    /// How long error toasts stay visible, in milliseconds.
    pub toast_duration_ms: u64,

    /// Route navigated to on 500.
    pub error_route: String,

    /// Route navigated to after a logout.
    pub login_route: String,

    /// Show a toast for 400 responses (silent by default).
    pub notify_bad_request: bool,

    /// Store 404s in the page error slot.
    pub record_not_found: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            mode: ClassifyMode::EveryAttempt,
            toast_duration_ms: 2500,
            error_route: "/error".to_string(),
            login_route: "/".to_string(),
            notify_bad_request: false,
            record_not_found: true,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 10 * 1024 * 1024, // bulk uploads
        }
    }
}
