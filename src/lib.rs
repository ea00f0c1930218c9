//! Form-encoded HTTP gateway for an RPC dispatch layer.
//!
//! Clients send `GET`/`HEAD`/`POST` requests whose query or body is
//! form-encoded; the URL path selects a service and one field selects the
//! operation. The gateway turns each request into a [`rpc::CanonicalRequest`] keyed by
//! `(module, command)`, hands it to the dispatch layer and writes the
//! answer back in the same encoding.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────┐
//!                 │                       GATEWAY                        │
//!                 │                                                      │
//!   Client ──────▶│  server ─▶ cors ─▶ reader ─▶ dispatcher ─▶ writer ──┼──▶ Client
//!                 │                      │           ▲                   │
//!                 │                      ▼           │                   │
//!                 │                 RouteTable   DispatchRegistry        │
//!                 │                      ▲           ▲                   │
//!                 │                      └─ builder ─┘ (startup)         │
//!                 │                                                      │
//!                 │   config · codec · lifecycle · observability         │
//!                 └──────────────────────────────────────────────────────┘
//! ```

// Core subsystems
pub mod codec;
pub mod config;
pub mod http;
pub mod routing;
pub mod rpc;

// Cross-cutting concerns
pub mod error;
pub mod lifecycle;
pub mod observability;

pub use config::{GatewayConfig, RoutingConfig};
pub use error::GatewayError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{RouteTable, ServiceBuilder};

