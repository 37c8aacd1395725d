//! Error types shared by the service clients and the dispatcher.

use thiserror::Error;

use crate::resilience::cancel::Cancelled;

/// Failure of one dispatched backend call.
///
/// The dispatcher hands the last of these back to the caller unchanged once
/// the retry budget is spent.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// The backend answered with a non-2xx status.
    #[error("{method} {url} failed with status {status}")]
    Status {
        status: u16,
        method: String,
        url: String,
        body: String,
    },

    /// No response was received (connect failure, timeout, reset).
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body was not the JSON the caller asked for.
    #[error("failed to decode response body: {0}")]
    Decode(String),

    /// The request could not be built (bad URL or header value).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The dispatch was cancelled before it finished.
    #[error("request cancelled")]
    Cancelled,
}

impl DispatchError {
    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            DispatchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<Cancelled> for DispatchError {
    fn from(_: Cancelled) -> Self {
        DispatchError::Cancelled
    }
}

impl From<reqwest::Error> for DispatchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            DispatchError::Decode(e.to_string())
        } else {
            DispatchError::Transport(e.to_string())
        }
    }
}

/// Errors raised while establishing or tearing down a session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("login rejected: {0}")]
    Rejected(String),

    #[error("login response did not contain a session id")]
    MissingSession,

    #[error("no user is signed in")]
    NotSignedIn,

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}
