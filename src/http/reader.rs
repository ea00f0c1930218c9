//! Request reading: HTTP request → canonical request.
//!
//! # Responsibilities
//! - Pick the raw form data (query for GET and HEAD, body for POST)
//! - Decode it and pull out the configured fields
//! - Resolve pattern + operation to module/command ids
//! - Turn the token into a connection id
//!
//! # Design Decisions
//! - Reading is split in two steps: the envelope (what the client sent) and
//!   resolution (what it maps to), so a rejected request can still echo the
//!   operation name and serial number back
//! - Decode errors are not fatal while the fields that matter survive
//! - A missing or unparsable serial number is 0, never an error

use std::sync::Arc;

use axum::http::Method;
use bytes::Bytes;
use thiserror::Error;

use crate::codec::{parse_form_encoded, CodecError};
use crate::config::RoutingConfig;
use crate::error::GatewayError;
use crate::http::token::TokenDecoder;
use crate::rpc::CanonicalRequest;

/// The fields a client sent, before any routing lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WireRequest {
    pub pattern: String,
    pub operation: String,
    pub token: String,
    pub serial_no: u16,
    pub params: String,
    /// First decoding problem met while parsing, if any.
    pub decode_error: Option<CodecError>,
}

/// A rejected request, with whatever could be recovered for the reply.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct ReadFailure {
    pub error: GatewayError,
    pub operation: String,
    pub serial_no: u16,
}

/// Translates HTTP requests into [`CanonicalRequest`]s.
#[derive(Clone, Default)]
pub struct RequestReader {
    decoder: Option<Arc<dyn TokenDecoder>>,
}

impl RequestReader {
    pub fn new(decoder: Option<Arc<dyn TokenDecoder>>) -> Self {
        Self { decoder }
    }

    /// Every request gets connection id 0.
    pub fn anonymous() -> Self {
        Self { decoder: None }
    }

    pub fn with_decoder(decoder: Arc<dyn TokenDecoder>) -> Self {
        Self {
            decoder: Some(decoder),
        }
    }

    /// Select the form data carried by the request.
    pub fn raw_data<'a>(
        method: &Method,
        query: Option<&'a str>,
        body: &'a [u8],
    ) -> Result<&'a str, GatewayError> {
        if method == Method::GET || method == Method::HEAD {
            Ok(query.unwrap_or_default())
        } else if method == Method::POST {
            std::str::from_utf8(body).map_err(|_| CodecError::InvalidUtf8.into())
        } else {
            Err(GatewayError::UnsupportedMethod(method.to_string()))
        }
    }

    /// Parse what the client sent.
    pub fn read_envelope(
        &self,
        method: &Method,
        path: &str,
        query: Option<&str>,
        body: &[u8],
        cfg: &RoutingConfig,
    ) -> Result<WireRequest, GatewayError> {
        let raw = Self::raw_data(method, query, body)?;
        tracing::debug!(raw = %raw, "Request raw data");

        let (values, decode_error) = parse_form_encoded(raw);
        if let Some(e) = &decode_error {
            tracing::warn!(error = %e, "Form decoding incomplete, continuing with decoded fields");
        }

        let field = |name: &str| values.get(name).unwrap_or_default().to_string();
        let envelope = WireRequest {
            pattern: path.to_string(),
            operation: field(&cfg.operation_field),
            token: field(&cfg.token_field),
            serial_no: values
                .get(&cfg.serial_no_field)
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
            params: field(&cfg.params_field),
            decode_error,
        };

        tracing::info!(
            pattern = %envelope.pattern,
            operation = %envelope.operation,
            serial_no = envelope.serial_no,
            "Request received"
        );
        tracing::debug!(token = %envelope.token, params = %envelope.params, "Request fields");

        Ok(envelope)
    }

    /// Map an envelope onto module/command ids and a connection id.
    pub fn resolve(
        &self,
        envelope: &WireRequest,
        cfg: &RoutingConfig,
    ) -> Result<CanonicalRequest, GatewayError> {
        let route = cfg
            .route(&envelope.pattern)
            .ok_or_else(|| GatewayError::UnknownPattern(envelope.pattern.clone()))?;

        let Some(operation) = route.operations.get(&envelope.operation) else {
            return Err(match &envelope.decode_error {
                Some(e) if envelope.operation.is_empty() => {
                    GatewayError::MalformedEncoding(e.clone())
                }
                _ => GatewayError::UnsupportedOperation {
                    pattern: envelope.pattern.clone(),
                    operation: envelope.operation.clone(),
                },
            });
        };

        let connection_id = match &self.decoder {
            Some(decoder) => {
                decoder.decode(&envelope.pattern, &envelope.operation, &envelope.token)?
            }
            None => 0,
        };

        tracing::debug!(
            module = route.module_id,
            command = operation.command_id,
            connection_id,
            "Request resolved"
        );

        Ok(CanonicalRequest {
            module_id: route.module_id,
            command_id: operation.command_id,
            connection_id,
            serial_no: envelope.serial_no,
            payload: Bytes::from(envelope.params.clone()),
        })
    }

    /// Read and resolve in one step.
    pub fn read(
        &self,
        method: &Method,
        path: &str,
        query: Option<&str>,
        body: &[u8],
        cfg: &RoutingConfig,
    ) -> Result<CanonicalRequest, ReadFailure> {
        let envelope = self
            .read_envelope(method, path, query, body, cfg)
            .map_err(|error| ReadFailure {
                error,
                operation: String::new(),
                serial_no: 0,
            })?;

        self.resolve(&envelope, cfg).map_err(|error| ReadFailure {
            error,
            operation: envelope.operation.clone(),
            serial_no: envelope.serial_no,
        })
    }
}

impl std::fmt::Debug for RequestReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestReader")
            .field("decoder", &self.decoder.is_some())
            .finish()
    }
}
