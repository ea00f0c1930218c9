//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request id, tracing, dispatch deadline)
//!     → cors.rs (preflight gate, permissive headers)
//!     → reader.rs (form data → WireRequest → CanonicalRequest)
//!         ↳ token.rs (token → connection id)
//!     → [dispatch layer runs the bound handler]
//!     → writer.rs (code + result → form-encoded body)
//!     → Send to client
//! ```

pub mod cors;
pub mod reader;
pub mod server;
pub mod token;
pub mod writer;

pub use reader::{ReadFailure, RequestReader, WireRequest};
pub use server::{AppState, HttpServer};
pub use token::{NumericTokenDecoder, TokenDecoder, TokenError};
pub use writer::{ResponseWriter, FORM_CONTENT_TYPE};
