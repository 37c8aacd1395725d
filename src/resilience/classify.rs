//! HTTP failure classification.
//!
//! # Responsibilities
//! - Map a failed response's status code to a fixed action
//! - Carry out the action's side effects (toast, forced logout, redirect, error slot)
//!
//! # Status Table
//! ```text
//! 400        → log only (toast only when `notify_bad_request` is set)
//! 401, 403   → "Unauthorized Access" toast, then logout
//! 404        → "Not Found" toast, error slot ← {404, message} unless `record_not_found` is off
//! 419, 420   → "Session Expired" toast, then logout
//! 500        → "Internal Server Error" toast, then navigate to the error route
//! other      → log only
//! ```
//!
//! # Design Decisions
//! - The classifier observes failures; it never changes a dispatch outcome
//! - Capabilities are injected so one table serves every service client
//! - Whether it fires per raw attempt or once per dispatch is `ClassifyMode`

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ClassifierConfig;
use crate::effects::{ErrorState, Navigator, Notifier, PageError};
use crate::error::DispatchError;
use crate::observability::metrics;

pub const UNAUTHORIZED_TITLE: &str = "Unauthorized Access";
pub const UNAUTHORIZED_MESSAGE: &str =
    "You do not have permission to access this resource. Please log in and try again.";
pub const NOT_FOUND_TITLE: &str = "Not Found";
pub const NOT_FOUND_MESSAGE: &str =
    "The requested resource could not be found. Please check the URL and try again.";
/// Message stored in the error slot on 404.
pub const NOT_FOUND_SLOT_MESSAGE: &str = "The requested resource could not be found";
pub const SESSION_EXPIRED_TITLE: &str = "Session Expired";
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again to continue.";
pub const SERVER_ERROR_TITLE: &str = "Internal Server Error";
pub const SERVER_ERROR_MESSAGE: &str = "An unexpected error occurred while processing your request. Please refresh the page or try again later.";
pub const BAD_REQUEST_TITLE: &str = "Bad Request";
pub const BAD_REQUEST_MESSAGE: &str =
    "The server could not process your request. Please check your input and try again.";

/// Session termination capability used by forced logouts.
#[async_trait]
pub trait SessionControl: Send + Sync {
    /// Clear the session and return to the login origin.
    ///
    /// Must be idempotent. Returns `true` only for the call that actually
    /// cleared something.
    async fn logout(&self) -> bool;
}

/// When the classifier runs relative to the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifyMode {
    /// On every failed response, before the retry decision.
    #[default]
    EveryAttempt,
    /// Once, on the error the dispatcher finally returns.
    FinalOutcome,
}

/// Action selected for a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorAction {
    BadRequest,
    Unauthorized,
    NotFound,
    SessionExpired,
    ServerError,
    Unclassified,
}

impl ErrorAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorAction::BadRequest => "bad_request",
            ErrorAction::Unauthorized => "unauthorized",
            ErrorAction::NotFound => "not_found",
            ErrorAction::SessionExpired => "session_expired",
            ErrorAction::ServerError => "server_error",
            ErrorAction::Unclassified => "unclassified",
        }
    }

    pub fn forces_logout(&self) -> bool {
        matches!(self, ErrorAction::Unauthorized | ErrorAction::SessionExpired)
    }
}

/// Pure status → action table.
pub fn classify(status: u16) -> ErrorAction {
    match status {
        400 => ErrorAction::BadRequest,
        401 | 403 => ErrorAction::Unauthorized,
        404 => ErrorAction::NotFound,
        419 | 420 => ErrorAction::SessionExpired,
        500 => ErrorAction::ServerError,
        _ => ErrorAction::Unclassified,
    }
}

/// One raw failed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedExchange {
    pub status: u16,
    pub method: String,
    pub url: String,
    pub body: String,
}

impl FailedExchange {
    /// Only status-bearing failures can be classified.
    pub fn from_error(error: &DispatchError) -> Option<Self> {
        match error {
            DispatchError::Status {
                status,
                method,
                url,
                body,
            } => Some(Self {
                status: *status,
                method: method.clone(),
                url: url.clone(),
                body: body.clone(),
            }),
            _ => None,
        }
    }
}

/// The shared status-code classifier.
#[derive(Clone)]
pub struct ErrorClassifier {
    session: Arc<dyn SessionControl>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    error_state: Arc<ErrorState>,
    config: ClassifierConfig,
}

impl ErrorClassifier {
    pub fn new(
        session: Arc<dyn SessionControl>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
        error_state: Arc<ErrorState>,
    ) -> Self {
        Self {
            session,
            notifier,
            navigator,
            error_state,
            config: ClassifierConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ClassifierConfig) -> Self {
        self.config = config;
        self
    }

    pub fn mode(&self) -> ClassifyMode {
        self.config.mode
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    fn toast(&self, title: &str, message: &str) {
        self.notifier
            .show_error_toast(title, message, Duration::from_millis(self.config.toast_duration_ms));
    }

    /// Apply the side effects for one failed exchange.
    pub async fn handle(&self, failure: &FailedExchange) -> ErrorAction {
        tracing::error!(
            status = failure.status,
            method = %failure.method,
            url = %failure.url,
            body = %failure.body,
            "API error"
        );

        let action = classify(failure.status);
        metrics::record_classified(action.as_str());

        match action {
            ErrorAction::BadRequest => {
                if self.config.notify_bad_request {
                    self.toast(BAD_REQUEST_TITLE, BAD_REQUEST_MESSAGE);
                }
            }
            ErrorAction::Unauthorized => {
                self.toast(UNAUTHORIZED_TITLE, UNAUTHORIZED_MESSAGE);
                tracing::info!("Unauthorized access");
                self.session.logout().await;
            }
            ErrorAction::NotFound => {
                self.toast(NOT_FOUND_TITLE, NOT_FOUND_MESSAGE);
                if self.config.record_not_found {
                    self.error_state.set(PageError::new(404, NOT_FOUND_SLOT_MESSAGE));
                }
            }
            ErrorAction::SessionExpired => {
                self.toast(SESSION_EXPIRED_TITLE, SESSION_EXPIRED_MESSAGE);
                tracing::info!("Session expired");
                self.session.logout().await;
            }
            ErrorAction::ServerError => {
                self.toast(SERVER_ERROR_TITLE, SERVER_ERROR_MESSAGE);
                self.navigator.navigate_to(&self.config.error_route);
            }
            ErrorAction::Unclassified => {
                tracing::info!(status = failure.status, "An error occurred (status code: {})", failure.status);
            }
        }

        action
    }
}

impl std::fmt::Debug for ErrorClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorClassifier")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
