//! HTTP gateway subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID set or kept)
//!     → routing (service prefix → upstream target)
//!     → hyper client forwards to the backend
//!     → response.rs (hop-by-hop strip, JSON gateway errors)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{request_id, X_REQUEST_ID};
pub use server::{apply_reload, spawn_reload_task, AppState, GatewayServer, SharedRoutes, HEALTH_PATH, ROUTES_PATH};
