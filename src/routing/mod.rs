//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     RoutingConfig (declaration order)
//!     → builder.rs (assign module/command ids)
//!     → resolve services + handlers, register payload shapes
//!     → Freeze as immutable RouteTable
//!
//! Incoming Request (path, operation field):
//!     → RouteTable lookup (exact path, exact operation name)
//!     → (module id, command id) or a rejection code
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Exact matching only (path and operation name are map keys)
//! - Deterministic: ids depend only on declaration order

pub mod builder;

pub use builder::{BuildError, BuildReport, RouteTable, ServiceBuilder};
