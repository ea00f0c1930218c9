//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML/JSON)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated)
//!     → routing section handed to the service builder
//!     → frozen RoutingConfig shared via Arc by the dispatch server
//! ```
//!
//! # Design Decisions
//! - Config is loaded once; there is no live reload
//! - All fields have defaults to allow minimal configs
//! - Pattern and operation maps are `IndexMap`s that reject repeated keys
//!   (ordered.rs), since module and command ids are derived from declaration
//!   order
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod ordered;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError, ConfigFormat};
pub use schema::{
    GatewayConfig, ListenerConfig, LogFormat, ObservabilityConfig, OperationRoute, ResponseCodes,
    RoutingConfig, ServiceRoute, TimeoutConfig,
};
pub use validation::{validate_config, validate_routing, ValidationError};
