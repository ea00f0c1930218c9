//! Startup binding of the routing configuration to live services.
//!
//! # Responsibilities
//! - Assign module ids (per route) and command ids (per operation) in
//!   declaration order
//! - Resolve each route's service and each operation's handler
//! - Register payload shapes and handlers in the dispatch registry
//! - Freeze the surviving routes into a [`RouteTable`]
//!
//! # Design Decisions
//! - Nothing here aborts startup: an unresolvable route or operation is
//!   logged, reported and removed, the rest keeps working
//! - Ids are assigned before anything can fail, so a skipped entry never
//!   shifts the ids of the entries after it
//! - A [`RouteTable`] can only come out of [`ServiceBuilder::build`], so the
//!   server cannot be started on an unbuilt configuration

use std::collections::HashSet;
use std::ops::Deref;
use std::sync::Arc;

use thiserror::Error;

use crate::config::{OperationRoute, RoutingConfig};
use crate::observability::metrics;
use crate::rpc::{DispatchRegistry, Service, ServiceRegistry};

/// Build-time problem. Each one disables a single route or operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("route {pattern}: service `{service}` is not registered")]
    ServiceNotFound { pattern: String, service: String },

    #[error("route {pattern} operation `{operation}`: payload registration failed: {reason}")]
    PayloadRegistrationFailed {
        pattern: String,
        operation: String,
        reason: String,
    },

    #[error("route {pattern} operation `{operation}`: handler binding failed: {reason}")]
    HandlerBindingFailed {
        pattern: String,
        operation: String,
        reason: String,
    },

    #[error("route {pattern}: no {kind} ids left")]
    IdSpaceExhausted { pattern: String, kind: &'static str },
}

/// Routing configuration after the build: ids assigned, every remaining
/// operation bound. Read-only and cheap to clone.
#[derive(Debug, Clone)]
pub struct RouteTable(Arc<RoutingConfig>);

impl RouteTable {
    /// The shared configuration, for components that hold it directly.
    pub fn shared(&self) -> Arc<RoutingConfig> {
        self.0.clone()
    }
}

impl Deref for RouteTable {
    type Target = RoutingConfig;

    fn deref(&self) -> &RoutingConfig {
        &self.0
    }
}

/// Outcome of a build.
#[derive(Debug)]
pub struct BuildReport {
    pub routes: RouteTable,
    /// Everything that was removed, in the order it was met.
    pub skipped: Vec<BuildError>,
}

impl BuildReport {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Binds a [`RoutingConfig`] against a [`ServiceRegistry`].
#[derive(Debug)]
pub struct ServiceBuilder<'a> {
    services: &'a ServiceRegistry,
}

impl<'a> ServiceBuilder<'a> {
    pub fn new(services: &'a ServiceRegistry) -> Self {
        Self { services }
    }

    /// Run the build. Consumes the configuration; the result is frozen.
    pub fn build(&self, mut config: RoutingConfig, registry: &mut DispatchRegistry) -> BuildReport {
        let mut skipped = Vec::new();
        let mut dead_routes = HashSet::new();
        let mut next_module: u16 = 0;

        for (pattern, route) in config.patterns.iter_mut() {
            let Some(module_id) = next_module.checked_add(1) else {
                skip(&mut skipped, BuildError::IdSpaceExhausted {
                    pattern: pattern.to_string(),
                    kind: "module",
                });
                dead_routes.insert(pattern.to_string());
                continue;
            };
            next_module = module_id;
            route.module_id = module_id;

            let Some(service) = self.services.get(&route.service) else {
                skip(&mut skipped, BuildError::ServiceNotFound {
                    pattern: pattern.to_string(),
                    service: route.service.clone(),
                });
                dead_routes.insert(pattern.to_string());
                continue;
            };

            tracing::info!(pattern = %pattern, service = %route.service, module = module_id, "Route bound");

            let mut dead_operations = HashSet::new();
            let mut next_command: u16 = 0;
            for (name, operation) in route.operations.iter_mut() {
                let Some(command_id) = next_command.checked_add(1) else {
                    skip(&mut skipped, BuildError::IdSpaceExhausted {
                        pattern: pattern.to_string(),
                        kind: "command",
                    });
                    dead_operations.insert(name.to_string());
                    continue;
                };
                next_command = command_id;
                operation.command_id = command_id;

                match bind_operation(module_id, operation, service.as_ref(), registry) {
                    Ok(()) => tracing::debug!(
                        pattern = %pattern,
                        operation = %name,
                        module = module_id,
                        command = command_id,
                        handler = %operation.handler,
                        "Operation bound"
                    ),
                    Err(failure) => {
                        skip(&mut skipped, failure.into_error(pattern, name));
                        dead_operations.insert(name.to_string());
                    }
                }
            }

            if !dead_operations.is_empty() {
                route.operations.retain(|name, _| !dead_operations.contains(name));
            }
        }

        if !dead_routes.is_empty() {
            config.patterns.retain(|pattern, _| !dead_routes.contains(pattern));
        }

        let bound = config.operation_count();
        metrics::record_bound_operations(bound);
        tracing::info!(
            routes = config.patterns.len(),
            operations = bound,
            skipped = skipped.len(),
            "Service build finished"
        );

        BuildReport {
            routes: RouteTable(Arc::new(config)),
            skipped,
        }
    }
}

fn skip(skipped: &mut Vec<BuildError>, error: BuildError) {
    tracing::warn!(error = %error, "Skipping");
    skipped.push(error);
}

enum BindFailure {
    Payload(String),
    Handler(String),
}

impl BindFailure {
    fn into_error(self, pattern: &str, operation: &str) -> BuildError {
        let (pattern, operation) = (pattern.to_string(), operation.to_string());
        match self {
            BindFailure::Payload(reason) => BuildError::PayloadRegistrationFailed {
                pattern,
                operation,
                reason,
            },
            BindFailure::Handler(reason) => BuildError::HandlerBindingFailed {
                pattern,
                operation,
                reason,
            },
        }
    }
}

fn bind_operation(
    module: u16,
    operation: &OperationRoute,
    service: &dyn Service,
    registry: &mut DispatchRegistry,
) -> Result<(), BindFailure> {
    let handler = service.handler(&operation.handler).ok_or_else(|| {
        BindFailure::Handler(format!(
            "service `{}` has no handler `{}`",
            service.name(),
            operation.handler
        ))
    })?;

    let command = operation.command_id;
    // checked first: registering payloads would clobber an existing binding
    if registry.is_bound(module, command) {
        return Err(BindFailure::Handler(format!(
            "module {module} command {command} is already bound"
        )));
    }

    registry
        .register_payload_type(module, command, &operation.request, &operation.response)
        .map_err(|e| BindFailure::Payload(e.to_string()))?;

    registry
        .bind_handler(module, command, handler)
        .map_err(|e| BindFailure::Handler(e.to_string()))
}
