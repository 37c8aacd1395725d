//! Process-wide error slot read by the page error boundary.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Error payload rendered by the surrounding page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageError {
    pub status_code: u16,
    pub message: String,
}

impl PageError {
    pub fn new(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            message: message.into(),
        }
    }
}

/// A single overwritable slot.
#[derive(Debug, Default)]
pub struct ErrorState {
    slot: Mutex<Option<PageError>>,
}

impl ErrorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, error: PageError) {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(error);
    }

    pub fn get(&self) -> Option<PageError> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn clear(&self) {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_is_overwritten_and_serialized_camel_case() {
        let state = ErrorState::new();
        state.set(PageError::new(500, "first"));
        state.set(PageError::new(404, "The requested resource could not be found"));

        let error = state.get().unwrap();
        assert_eq!(error.status_code, 404);
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["statusCode"], 404);

        state.clear();
        assert!(state.get().is_none());
    }
}
