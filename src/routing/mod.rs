//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path + query
//!     → router.rs (longest matching service prefix)
//!     → matcher.rs (segment-boundary prefix check and strip)
//!     → RouteMatch { service, upstream target } or None
//!
//! Route compilation (startup and every reload):
//!     ServiceRoute[]
//!     → parse upstream URLs
//!     → sort by prefix length
//!     → freeze as immutable ServiceRouter
//! ```

pub mod matcher;
pub mod router;

pub use matcher::PathPrefixMatcher;
pub use router::{RouteError, RouteMatch, ServiceRouter};
