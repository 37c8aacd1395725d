//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Service call:
//!     → retries.rs (Dispatcher: fixed-delay bounded retry)
//!         → each raw failure: classify.rs (ErrorClassifier side effects)
//!     → cancel.rs (optional CancelToken stops attempts and delays)
//! ```
//!
//! # Design Decisions
//! - Retry and classification are independent; the client wires them together
//! - Delay is constant and injected, so timing is testable
//! - Cancellation is opt-in per dispatch

pub mod cancel;
pub mod classify;
pub mod retries;

pub use cancel::{CancelToken, Cancelled};
pub use classify::{classify, ClassifyMode, ErrorAction, ErrorClassifier, FailedExchange, SessionControl};
pub use retries::{Dispatcher, RetryPolicy, Sleeper, TokioSleeper};
