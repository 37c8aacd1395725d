//! Client-side navigation.

use std::sync::Mutex;

/// Fire-and-forget redirect capability.
pub trait Navigator: Send + Sync {
    fn navigate_to(&self, path: &str);
}

/// Records every navigation in order.
#[derive(Debug)]
pub struct History {
    entries: Mutex<Vec<String>>,
}

impl History {
    /// Start at `initial` (usually `/`).
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            entries: Mutex::new(vec![initial.into()]),
        }
    }

    pub fn current(&self) -> String {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .cloned()
            .unwrap_or_else(|| "/".to_string())
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for History {
    fn navigate_to(&self, path: &str) {
        tracing::debug!(path, "navigate");
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(path.to_string());
    }
}

/// Logs navigations; used where no router exists.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate_to(&self, path: &str) {
        tracing::info!(path, "navigate");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_tracks_latest_path() {
        let history = History::default();
        assert_eq!(history.current(), "/");
        history.navigate_to("/error");
        assert_eq!(history.current(), "/error");
        assert_eq!(history.entries(), vec!["/", "/error"]);
    }
}
