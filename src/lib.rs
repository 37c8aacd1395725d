//! Admin dashboard API gateway and resilient service clients.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────┐
//!                    │                  ADMIN GATEWAY                   │
//!  Dashboard         │  ┌─────────┐   ┌─────────┐   ┌──────────────┐   │
//!  ──────────────────┼─▶│  http   │──▶│ routing │──▶│ hyper client │───┼──▶ Backend
//!                    │  │ server  │   │ prefix  │   │   forward    │   │    services
//!                    │  └─────────┘   └─────────┘   └──────────────┘   │
//!                    │                                                  │
//!                    │  ┌──────────────────────────────────────────┐   │
//!                    │  │ client: ServiceClient per prefix         │   │
//!                    │  │   session → auth headers                 │   │
//!                    │  │   resilience → Dispatcher (retry)        │   │
//!                    │  │   resilience → ErrorClassifier           │   │
//!                    │  │       → effects (toast, navigate, slot)  │   │
//!                    │  │       → session logout                   │   │
//!                    │  └──────────────────────────────────────────┘   │
//!                    │                                                  │
//!                    │  config · observability · lifecycle              │
//!                    └──────────────────────────────────────────────────┘
//! ```

pub mod client;
pub mod config;
pub mod effects;
pub mod error;
pub mod history;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod routing;
pub mod session;

pub use client::{AuthClient, ClientContext, ServiceClient};
pub use config::GatewayConfig;
pub use error::{DispatchError, SessionError};
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
pub use resilience::{Dispatcher, ErrorClassifier, RetryPolicy};
pub use session::SessionStore;
