//! Request-time error taxonomy.
//!
//! Every variant is answered with a wire response carrying one of the
//! reserved codes from [`ResponseCodes`]; nothing here is ever retried.

use thiserror::Error;

use crate::codec::CodecError;
use crate::config::ResponseCodes;
use crate::http::token::TokenError;
use crate::rpc::DispatchError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("unsupported http method {0}")]
    UnsupportedMethod(String),

    #[error("malformed form encoding: {0}")]
    MalformedEncoding(#[from] CodecError),

    #[error("request body unreadable: {0}")]
    BodyUnreadable(String),

    #[error("unknown pattern {0}")]
    UnknownPattern(String),

    #[error("operation `{operation}` is not supported on {pattern}")]
    UnsupportedOperation { pattern: String, operation: String },

    #[error("token decode failed: {0}")]
    TokenDecodeFailed(#[from] TokenError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("dispatch aborted: {0}")]
    DispatchAborted(String),

    #[error("no reply from handler within {0}s")]
    DispatchTimedOut(u64),
}

impl GatewayError {
    /// The response code written for this error.
    pub fn code(&self, codes: &ResponseCodes) -> i32 {
        match self {
            GatewayError::UnsupportedMethod(_) => codes.unsupported_method,
            GatewayError::MalformedEncoding(_) | GatewayError::BodyUnreadable(_) => {
                codes.malformed_encoding
            }
            GatewayError::UnknownPattern(_) => codes.unknown_pattern,
            GatewayError::UnsupportedOperation { .. } => codes.unsupported_operation,
            GatewayError::TokenDecodeFailed(_) => codes.token_decode_failed,
            GatewayError::Dispatch(DispatchError::UnknownCommand { .. }) => codes.unknown_command,
            GatewayError::Dispatch(DispatchError::PayloadRejected { .. }) => {
                codes.payload_decode_failed
            }
            // A failure must never read as success on the wire.
            GatewayError::Dispatch(DispatchError::Handler(e))
                if e.code == 0 || e.code == codes.success =>
            {
                codes.internal_error
            }
            GatewayError::Dispatch(DispatchError::Handler(e)) => e.code,
            GatewayError::DispatchAborted(_) => codes.internal_error,
            GatewayError::DispatchTimedOut(_) => codes.dispatch_timeout,
        }
    }
}
