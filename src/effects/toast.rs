//! Transient notifications.
//!
//! # Responsibilities
//! - Show error and success toasts with a title, message and duration
//! - Keep at most one toast visible at a time
//!
//! # Design Decisions
//! - Showing a toast clears whatever is on screen first
//! - A toast expires after its duration; expiry is evaluated lazily on read
//! - Only the last `HISTORY_LIMIT` toasts are remembered

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

/// Default time a toast stays on screen.
pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(2500);

/// Toasts kept by [`Toaster::history`].
pub const HISTORY_LIMIT: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastColor {
    Success,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub title: String,
    pub message: String,
    pub color: ToastColor,
    #[serde(with = "millis")]
    pub duration: Duration,
}

impl Toast {
    pub fn error(title: impl Into<String>, message: impl Into<String>, duration: Duration) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            color: ToastColor::Danger,
            duration,
        }
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>, duration: Duration) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            color: ToastColor::Success,
            duration,
        }
    }
}

mod millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }
}

/// Sink for user-visible messages.
pub trait Notifier: Send + Sync {
    fn show(&self, toast: Toast);

    fn show_error_toast(&self, title: &str, message: &str, duration: Duration) {
        self.show(Toast::error(title, message, duration));
    }

    fn show_success_toast(&self, title: &str, message: &str, duration: Duration) {
        self.show(Toast::success(title, message, duration));
    }
}

#[derive(Debug)]
struct Shown {
    toast: Toast,
    at: Instant,
}

/// In-process toaster with an at-most-one-visible policy.
#[derive(Debug, Default)]
pub struct Toaster {
    visible: Mutex<Option<Shown>>,
    shown: Mutex<VecDeque<Toast>>,
}

impl Toaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// The toast currently on screen, if it has not expired.
    pub fn current(&self) -> Option<Toast> {
        let mut visible = self.visible.lock().unwrap_or_else(|e| e.into_inner());
        let expired = match visible.as_ref() {
            Some(shown) => shown.at.elapsed() >= shown.toast.duration,
            None => return None,
        };
        if expired {
            *visible = None;
            return None;
        }
        visible.as_ref().map(|shown| shown.toast.clone())
    }

    pub fn clear_all(&self) {
        *self.visible.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    /// Recently shown toasts, oldest first.
    pub fn history(&self) -> Vec<Toast> {
        self.shown
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect()
    }
}

impl Notifier for Toaster {
    fn show(&self, toast: Toast) {
        self.clear_all();
        {
            let mut shown = self.shown.lock().unwrap_or_else(|e| e.into_inner());
            if shown.len() == HISTORY_LIMIT {
                shown.pop_front();
            }
            shown.push_back(toast.clone());
        }
        *self.visible.lock().unwrap_or_else(|e| e.into_inner()) = Some(Shown {
            toast,
            at: Instant::now(),
        });
    }
}

/// Writes toasts to the log instead of a screen.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn show(&self, toast: Toast) {
        match toast.color {
            ToastColor::Danger => tracing::warn!(title = %toast.title, message = %toast.message, "toast"),
            ToastColor::Success => tracing::info!(title = %toast.title, message = %toast.message, "toast"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_toast_replaces_visible_one() {
        let toaster = Toaster::new();
        toaster.show_error_toast("Not Found", "missing", DEFAULT_TOAST_DURATION);
        toaster.show_success_toast("Saved", "school updated", DEFAULT_TOAST_DURATION);

        let current = toaster.current().expect("a toast is visible");
        assert_eq!(current.title, "Saved");
        assert_eq!(current.color, ToastColor::Success);
        assert_eq!(toaster.history().len(), 2);
    }

    #[test]
    fn history_keeps_only_recent_toasts() {
        let toaster = Toaster::new();
        for i in 0..HISTORY_LIMIT + 6 {
            toaster.show_error_toast("Not Found", &format!("missing {}", i), DEFAULT_TOAST_DURATION);
        }

        let history = toaster.history();
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history[0].message, "missing 6");
        assert_eq!(history[HISTORY_LIMIT - 1].message, format!("missing {}", HISTORY_LIMIT + 5));
    }

    #[tokio::test(start_paused = true)]
    async fn toast_expires_after_its_duration() {
        let toaster = Toaster::new();
        toaster.show_error_toast("Session Expired", "bye", Duration::from_millis(2500));
        assert!(toaster.current().is_some());

        tokio::time::advance(Duration::from_millis(2600)).await;
        assert!(toaster.current().is_none());
    }

    #[test]
    fn toast_serializes_duration_in_millis() {
        let toast = Toast::error("Oops!", "broken", Duration::from_millis(2500));
        let json = serde_json::to_value(&toast).unwrap();
        assert_eq!(json["duration"], 2500);
        assert_eq!(json["color"], "danger");
    }
}
