//! `(module, command)` dispatch table with payload shape checks.

use std::collections::HashMap;
use std::fmt;

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::rpc::message::{CanonicalRequest, CanonicalResponse};
use crate::rpc::service::{Handler, HandlerError};

/// Anything that can answer a canonical request.
pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, request: &CanonicalRequest) -> Result<CanonicalResponse, DispatchError>;
}

/// Request-time dispatch failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("no handler bound for module {module} command {command}")]
    UnknownCommand { module: u16, command: u16 },

    #[error("payload does not match `{shape}`: {reason}")]
    PayloadRejected { shape: String, reason: String },

    #[error(transparent)]
    Handler(#[from] HandlerError),
}

/// Startup-time registration failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("payload shape `{0}` is not registered")]
    UnknownShape(String),

    #[error("module {module} command {command} is already bound")]
    DuplicateHandler { module: u16, command: u16 },
}

type ShapeCheck = fn(&[u8]) -> Result<(), serde_json::Error>;

fn check_shape<T: DeserializeOwned>(payload: &[u8]) -> Result<(), serde_json::Error> {
    serde_json::from_slice::<T>(payload).map(|_| ())
}

#[derive(Clone)]
struct PayloadShape {
    name: String,
    check: ShapeCheck,
}

#[derive(Clone, Default)]
struct PayloadBinding {
    request: Option<PayloadShape>,
    response: Option<PayloadShape>,
}

/// Handler and payload tables keyed by `(module, command)`.
///
/// Filled during startup, then shared read-only as an
/// `Arc<dyn Dispatcher>`.
#[derive(Default)]
pub struct DispatchRegistry {
    shapes: HashMap<String, ShapeCheck>,
    payloads: HashMap<(u16, u16), PayloadBinding>,
    handlers: HashMap<(u16, u16), Handler>,
}

impl DispatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a payload shape available under `name`. Payloads bound to it
    /// must deserialize as JSON into `T`.
    pub fn register_shape<T: DeserializeOwned>(&mut self, name: impl Into<String>) {
        self.shapes.insert(name.into(), check_shape::<T>);
    }

    fn shape(&self, name: &str) -> Result<Option<PayloadShape>, RegistrationError> {
        if name.is_empty() {
            return Ok(None);
        }
        self.shapes
            .get(name)
            .map(|&check| {
                Some(PayloadShape {
                    name: name.to_string(),
                    check,
                })
            })
            .ok_or_else(|| RegistrationError::UnknownShape(name.to_string()))
    }

    /// Bind request/response shapes to `(module, command)`. Empty names
    /// mean untyped. Nothing is recorded if either name is unknown.
    pub fn register_payload_type(
        &mut self,
        module: u16,
        command: u16,
        request: &str,
        response: &str,
    ) -> Result<(), RegistrationError> {
        let binding = PayloadBinding {
            request: self.shape(request)?,
            response: self.shape(response)?,
        };
        if binding.request.is_some() || binding.response.is_some() {
            self.payloads.insert((module, command), binding);
        }
        Ok(())
    }

    /// Bind a handler. Each `(module, command)` pair can be bound once.
    pub fn bind_handler(
        &mut self,
        module: u16,
        command: u16,
        handler: Handler,
    ) -> Result<(), RegistrationError> {
        if self.handlers.contains_key(&(module, command)) {
            return Err(RegistrationError::DuplicateHandler { module, command });
        }
        self.handlers.insert((module, command), handler);
        Ok(())
    }

    pub fn is_bound(&self, module: u16, command: u16) -> bool {
        self.handlers.contains_key(&(module, command))
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

impl Dispatcher for DispatchRegistry {
    fn dispatch(&self, request: &CanonicalRequest) -> Result<CanonicalResponse, DispatchError> {
        let key = (request.module_id, request.command_id);
        let handler = self.handlers.get(&key).ok_or(DispatchError::UnknownCommand {
            module: request.module_id,
            command: request.command_id,
        })?;

        let binding = self.payloads.get(&key);
        if let Some(shape) = binding.and_then(|b| b.request.as_ref()) {
            (shape.check)(&request.payload).map_err(|e| DispatchError::PayloadRejected {
                shape: shape.name.clone(),
                reason: e.to_string(),
            })?;
        }

        let response = handler(request)?;

        if let Some(shape) = binding.and_then(|b| b.response.as_ref()) {
            if let Err(e) = (shape.check)(&response.payload) {
                tracing::warn!(
                    module = request.module_id,
                    command = request.command_id,
                    shape = %shape.name,
                    error = %e,
                    "Handler response does not match its declared shape"
                );
            }
        }

        Ok(response)
    }
}

impl fmt::Debug for DispatchRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchRegistry")
            .field("shapes", &self.shapes.len())
            .field("payload_bindings", &self.payloads.len())
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
