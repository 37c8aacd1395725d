//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check service prefixes are well-formed and unique
//! - Check upstreams are absolute http URLs (the forwarding client speaks plain HTTP)
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid bind address '{0}'")]
    InvalidBindAddress(String),

    #[error("invalid metrics address '{0}'")]
    InvalidMetricsAddress(String),

    #[error("no services configured")]
    NoServices,

    #[error("service '{name}': prefix '{prefix}' must start with '/', must not end with '/' and must not be '/'")]
    InvalidPrefix { name: String, prefix: String },

    #[error("duplicate service prefix '{0}'")]
    DuplicatePrefix(String),

    #[error("duplicate service name '{0}'")]
    DuplicateName(String),

    #[error("service '{name}': invalid upstream '{upstream}': {reason}")]
    InvalidUpstream {
        name: String,
        upstream: String,
        reason: String,
    },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("{field} '{value}' must be an absolute path")]
    InvalidRoute { field: &'static str, value: String },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.services.is_empty() {
        errors.push(ValidationError::NoServices);
    }

    let mut prefixes = HashSet::new();
    let mut names = HashSet::new();
    for service in &config.services {
        let prefix = service.prefix.as_str();
        if !prefix.starts_with('/') || prefix.ends_with('/') {
            errors.push(ValidationError::InvalidPrefix {
                name: service.name.clone(),
                prefix: service.prefix.clone(),
            });
        }
        if !prefixes.insert(prefix) {
            errors.push(ValidationError::DuplicatePrefix(service.prefix.clone()));
        }
        if !names.insert(service.name.as_str()) {
            errors.push(ValidationError::DuplicateName(service.name.clone()));
        }
        if let Err(reason) = check_upstream(&service.upstream) {
            errors.push(ValidationError::InvalidUpstream {
                name: service.name.clone(),
                upstream: service.upstream.clone(),
                reason,
            });
        }
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.connect_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::Zero("security.max_body_size"));
    }

    for (field, value) in [
        ("classifier.error_route", &config.classifier.error_route),
        ("classifier.login_route", &config.classifier.login_route),
    ] {
        if !value.starts_with('/') {
            errors.push(ValidationError::InvalidRoute {
                field,
                value: value.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_upstream(upstream: &str) -> Result<(), String> {
    let url = Url::parse(upstream).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("query and fragment are not allowed".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ServiceRoute;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate_config(&GatewayConfig::default()), Ok(()));
    }

    #[test]
    fn collects_every_error() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.timeouts.request_secs = 0;
        config.services = vec![
            ServiceRoute::new("media", "media_service", "http://10.0.0.1:8088"),
            ServiceRoute::new("media", "/notification_service", "ftp://10.0.0.1"),
            ServiceRoute::new("notify", "/notification_service", "http://10.0.0.1:8085"),
        ];

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::InvalidBindAddress("not-an-address".into())));
        assert!(errors.contains(&ValidationError::Zero("timeouts.request_secs")));
        assert!(errors.contains(&ValidationError::DuplicateName("media".into())));
        assert!(errors.contains(&ValidationError::DuplicatePrefix("/notification_service".into())));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidPrefix { prefix, .. } if prefix == "media_service")));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidUpstream { upstream, .. } if upstream == "ftp://10.0.0.1")));
    }

    #[test]
    fn root_prefix_and_trailing_slash_are_rejected() {
        let mut config = GatewayConfig::default();
        config.services = vec![
            ServiceRoute::new("root", "/", "http://10.0.0.1"),
            ServiceRoute::new("trailing", "/media_service/", "http://10.0.0.2"),
        ];
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn empty_route_table_is_rejected() {
        let mut config = GatewayConfig::default();
        config.services.clear();
        assert_eq!(validate_config(&config), Err(vec![ValidationError::NoServices]));
    }
}
