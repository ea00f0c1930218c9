//! Services and the registry that resolves them by identifier.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::rpc::message::{CanonicalRequest, CanonicalResponse};

/// Failure reported by a handler. The code is written to the response and
/// the message replaces the result payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HandlerError {
    pub code: i32,
    pub message: String,
}

impl HandlerError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// A callable bound to one `(module, command)` pair.
pub type Handler =
    Arc<dyn Fn(&CanonicalRequest) -> Result<CanonicalResponse, HandlerError> + Send + Sync>;

/// A named group of handlers.
pub trait Service: Send + Sync {
    /// Identifier used by the routing configuration.
    fn name(&self) -> &str;

    /// Look up a handler by the name the configuration uses.
    fn handler(&self, name: &str) -> Option<Handler>;
}

/// A service backed by a handler table filled at construction.
///
/// ```
/// use rpc_http_gateway::rpc::{BasicService, CanonicalResponse};
///
/// let service = BasicService::new("ExampleService")
///     .with_handler("OnPing", |_req| Ok(CanonicalResponse::ok("pong")));
/// ```
pub struct BasicService {
    name: String,
    handlers: HashMap<String, Handler>,
}

impl BasicService {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handlers: HashMap::new(),
        }
    }

    /// Add a handler, builder style.
    pub fn with_handler<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&CanonicalRequest) -> Result<CanonicalResponse, HandlerError> + Send + Sync + 'static,
    {
        self.add_handler(name, handler);
        self
    }

    /// Add or replace a handler.
    pub fn add_handler<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(&CanonicalRequest) -> Result<CanonicalResponse, HandlerError> + Send + Sync + 'static,
    {
        self.handlers.insert(name.into(), Arc::new(handler));
    }

    pub fn handler_names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

impl Service for BasicService {
    fn name(&self) -> &str {
        &self.name
    }

    fn handler(&self, name: &str) -> Option<Handler> {
        self.handlers.get(name).cloned()
    }
}

impl fmt::Debug for BasicService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.handler_names().collect();
        names.sort_unstable();
        f.debug_struct("BasicService")
            .field("name", &self.name)
            .field("handlers", &names)
            .finish()
    }
}

/// Services available to the builder, keyed by [`Service::name`].
#[derive(Default)]
pub struct ServiceRegistry {
    services: HashMap<String, Arc<dyn Service>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service under its own name. A previous service with the
    /// same name is returned.
    pub fn bind_service(&mut self, service: Arc<dyn Service>) -> Option<Arc<dyn Service>> {
        let name = service.name().to_string();
        tracing::debug!(service = %name, "Service registered");
        self.services.insert(name, service)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Service>> {
        self.services.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.services.keys()).finish()
    }
}
