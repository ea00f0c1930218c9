//! In-process RPC dispatch layer.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     application → ServiceRegistry::bind_service(service)
//!     application → DispatchRegistry::register_shape::<T>(name)
//!     service builder → register_payload_type / bind_handler per operation
//!
//! Request time:
//!     CanonicalRequest
//!     → DispatchRegistry::dispatch (module/command lookup)
//!     → payload shape check
//!     → Handler
//!     → CanonicalResponse
//! ```
//!
//! # Design Decisions
//! - Handlers are looked up by name from an explicit table each service
//!   fills at construction; nothing is discovered at runtime
//! - Registries are mutated only during startup, then frozen behind `Arc`
//! - `Dispatcher` is the seam the HTTP layer depends on

pub mod message;
pub mod registry;
pub mod service;

pub use message::{CanonicalRequest, CanonicalResponse};
pub use registry::{DispatchError, DispatchRegistry, Dispatcher, RegistrationError};
pub use service::{BasicService, Handler, HandlerError, Service, ServiceRegistry};
