//! Response writing: canonical response → form-encoded wire bytes.
//!
//! # Responsibilities
//! - Encode `operation`, serial number, code and result under the
//!   configured field names
//! - Replace the result with the quoted error message when something failed
//! - Set the form content type
//!
//! # Design Decisions
//! - Always HTTP 200; success or failure travels in the code field
//! - Field names are never hard-coded
//! - Once the response is handed back, hyper owns the socket; a client that
//!   hung up is logged by the transport, never raised

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;

use crate::codec::percent_encode;
use crate::config::RoutingConfig;

/// Media type of every wire response.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Builds wire responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseWriter;

impl ResponseWriter {
    pub fn new() -> Self {
        Self
    }

    /// Produce the wire body.
    ///
    /// With default field names: `opr=<op>&sno=<sno>&code=<code>&result=<result>`.
    pub fn encode(
        &self,
        code: i32,
        operation: &str,
        serial_no: u16,
        result: &str,
        error: Option<&dyn std::error::Error>,
        cfg: &RoutingConfig,
    ) -> String {
        let result = match error {
            Some(e) => percent_encode(&format!("\"{e}\"")),
            None => percent_encode(result),
        };

        format!(
            "{}={}&{}={}&{}={}&{}={}",
            cfg.operation_field,
            percent_encode(operation),
            cfg.serial_no_field,
            serial_no,
            cfg.code_field,
            code,
            cfg.result_field,
            result,
        )
    }

    /// Produce the full HTTP response.
    pub fn write(
        &self,
        code: i32,
        operation: &str,
        serial_no: u16,
        result: &str,
        error: Option<&dyn std::error::Error>,
        cfg: &RoutingConfig,
    ) -> Response {
        let body = self.encode(code, operation, serial_no, result, error, cfg);
        tracing::debug!(raw = %body, "Response raw data");

        let mut response = Response::new(Body::from(body));
        *response.status_mut() = StatusCode::OK;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(FORM_CONTENT_TYPE),
        );
        response
    }
}
