//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (route lookup)
//!     → matcher.rs (evaluate match conditions)
//!     → Return: matched Route or no match
//!
//! Route Registration (at startup):
//!     handlers::route_table()
//!     → Compile matchers (method AND exact path)
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes registered at startup, immutable at runtime
//! - Deterministic: same input always matches same route
//! - First match wins (registration order)

pub mod matcher;
pub mod router;

pub use router::{Handler, HandlerFuture, RequestScope, Route, RouteTable};
