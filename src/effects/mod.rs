//! User-visible side effects.
//!
//! # Data Flow
//! ```text
//! ErrorClassifier (resilience/classify.rs)
//!     → toast.rs (Notifier: transient error/success messages)
//!     → navigation.rs (Navigator: redirects such as /error or /)
//!     → error_state.rs (ErrorState: page-level error slot)
//! ```
//!
//! # Design Decisions
//! - Every sink is injected as a trait object or `Arc`, never a global
//! - Sinks are synchronous and fire-and-forget from the caller's view
//! - Log-backed implementations exist for headless binaries

pub mod error_state;
pub mod navigation;
pub mod toast;

pub use error_state::{ErrorState, PageError};
pub use navigation::{History, LogNavigator, Navigator};
pub use toast::{LogNotifier, Notifier, Toast, ToastColor, Toaster};
