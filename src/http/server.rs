//! HTTP server setup and the per-request dispatch flow.
//!
//! # Responsibilities
//! - Create the Axum Router with the gateway handler as the only route
//! - Wire up middleware (request id, tracing, CORS, panic finaliser)
//! - Run each request through reader → dispatcher → writer, with a deadline
//!   on the dispatch step
//! - Bind server to listener and drain on shutdown
//!
//! # Request Flow
//! ```text
//! START → CORS gate ─┬─ OPTIONS → 204, END
//!                    └─ READ ─┬─ rejected ──────────────┐
//!                             └─ DISPATCH (blocking) ───┴→ WRITE → END
//! ```

use std::any::Any;
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{Request, State},
    http::{request::Parts, Method},
    middleware,
    response::Response,
    Router,
};
use bytes::Bytes;
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::http::cors::cors_middleware;
use crate::http::reader::RequestReader;
use crate::http::writer::ResponseWriter;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::routing::RouteTable;
use crate::rpc::{CanonicalResponse, Dispatcher};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: RouteTable,
    pub reader: Arc<RequestReader>,
    pub writer: ResponseWriter,
    pub dispatcher: Arc<dyn Dispatcher>,
    pub max_body_size: usize,
    /// How long a handler may take before the client gets `dispatch_timeout`.
    pub dispatch_timeout: Duration,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    drain_timeout: Duration,
}

impl HttpServer {
    /// Create a new HTTP server. Takes a built [`RouteTable`], so the
    /// service build has necessarily run already.
    pub fn new(
        config: &GatewayConfig,
        routes: RouteTable,
        reader: RequestReader,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Self {
        let state = AppState {
            routes,
            reader: Arc::new(reader),
            writer: ResponseWriter::new(),
            dispatcher,
            max_body_size: config.listener.max_body_size,
            dispatch_timeout: Duration::from_secs(config.timeouts.request_secs),
        };

        tracing::debug!(
            routes = state.routes.patterns.len(),
            operations = state.routes.operation_count(),
            cors = state.routes.allow_origin,
            "HTTP server configured"
        );

        let router = Self::build_router(state);
        Self {
            router,
            drain_timeout: Duration::from_secs(config.timeouts.shutdown_secs),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        let routes = state.routes.clone();
        let writer = state.writer;
        let finaliser = move |panic: Box<dyn Any + Send + 'static>| {
            let error = GatewayError::DispatchAborted(panic_message(&*panic));
            tracing::error!(error = %error, "Request handling panicked");
            writer.write(error.code(&routes.codes), "", 0, "", Some(&error), &routes)
        };

        Router::new()
            .fallback(gateway_handler)
            .with_state(state.clone())
            .layer(CatchPanicLayer::custom(finaliser))
            .layer(middleware::from_fn_with_state(
                state.routes.shared(),
                cors_middleware,
            ))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` is triggered.
    ///
    /// After the trigger no new connections are accepted; in-flight requests
    /// get the drain timeout to finish before they are abandoned. The
    /// shutdown-complete signal is raised on the way out.
    pub async fn run(self, listener: TcpListener, shutdown: Arc<Shutdown>) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let mut stop = shutdown.subscribe();
        let serve = axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                stop.recv().await;
                tracing::info!("Shutdown triggered, draining in-flight requests");
            })
            .into_future();

        let mut expire = shutdown.subscribe();
        let drain_timeout = self.drain_timeout;
        let deadline = async move {
            expire.recv().await;
            tokio::time::sleep(drain_timeout).await;
        };

        let result = tokio::select! {
            result = serve => result,
            _ = deadline => {
                tracing::warn!(
                    timeout_secs = drain_timeout.as_secs(),
                    "Drain timeout elapsed, abandoning in-flight requests"
                );
                Ok(())
            }
        };

        if shutdown.mark_complete() {
            tracing::info!("HTTP server stopped");
        }
        result
    }
}

/// Metric label for requests that never matched a configured route.
const UNMATCHED: &str = "unknown";

/// What is known about a request by the time it is answered.
struct Exchange {
    operation: String,
    serial_no: u16,
    /// Pattern and operation, once both were found in the route table.
    route: Option<(String, String)>,
    outcome: Result<CanonicalResponse, GatewayError>,
}

impl Exchange {
    fn rejected(error: GatewayError) -> Self {
        Self {
            operation: String::new(),
            serial_no: 0,
            route: None,
            outcome: Err(error),
        }
    }

    /// Labels for the request metrics. Only names taken from the route
    /// table are used, so clients cannot mint new series.
    fn metric_labels(&self) -> (&str, &str) {
        match &self.route {
            Some((pattern, operation)) => (pattern.as_str(), operation.as_str()),
            None => (UNMATCHED, UNMATCHED),
        }
    }
}

/// Single entry point for every path. The writer runs on every branch.
async fn gateway_handler(State(state): State<AppState>, request: Request) -> Response {
    let start = Instant::now();
    let (parts, body) = request.into_parts();
    let path = parts.uri.path();

    let exchange = exchange(&state, &parts, body).await;
    let routes = &state.routes;

    let (code, response) = match &exchange.outcome {
        Ok(reply) => {
            let code = if reply.code == 0 {
                routes.codes.success
            } else {
                reply.code
            };
            let result = reply.payload_text();
            let response = state.writer.write(
                code,
                &exchange.operation,
                exchange.serial_no,
                &result,
                None,
                routes,
            );
            (code, response)
        }
        Err(error) => {
            let code = error.code(&routes.codes);
            tracing::warn!(
                path = %path,
                operation = %exchange.operation,
                code,
                error = %error,
                "Request failed"
            );
            let response = state.writer.write(
                code,
                &exchange.operation,
                exchange.serial_no,
                "",
                Some(error),
                routes,
            );
            (code, response)
        }
    };

    let (pattern, operation) = exchange.metric_labels();
    metrics::record_request(pattern, operation, code, start);
    response
}

async fn exchange(state: &AppState, parts: &Parts, body: Body) -> Exchange {
    let body = if parts.method == Method::POST {
        match axum::body::to_bytes(body, state.max_body_size).await {
            Ok(bytes) => bytes,
            Err(e) => return Exchange::rejected(GatewayError::BodyUnreadable(e.to_string())),
        }
    } else {
        Bytes::new()
    };

    let envelope = match state.reader.read_envelope(
        &parts.method,
        parts.uri.path(),
        parts.uri.query(),
        &body,
        &state.routes,
    ) {
        Ok(envelope) => envelope,
        Err(error) => return Exchange::rejected(error),
    };

    let mut exchange = Exchange {
        operation: envelope.operation.clone(),
        serial_no: envelope.serial_no,
        route: None,
        outcome: Ok(CanonicalResponse::default()),
    };

    let request = match state.reader.resolve(&envelope, &state.routes) {
        Ok(request) => request,
        Err(error) => {
            exchange.outcome = Err(error);
            return exchange;
        }
    };

    exchange.route = Some((envelope.pattern, envelope.operation));

    // A blocking task cannot be cancelled; past the deadline its reply is
    // dropped.
    let dispatcher = state.dispatcher.clone();
    let dispatch = tokio::task::spawn_blocking(move || dispatcher.dispatch(&request));
    exchange.outcome = match tokio::time::timeout(state.dispatch_timeout, dispatch).await {
        Ok(Ok(Ok(reply))) => Ok(reply),
        Ok(Ok(Err(error))) => Err(error.into()),
        Ok(Err(join)) => Err(GatewayError::DispatchAborted(join.to_string())),
        Err(_) => Err(GatewayError::DispatchTimedOut(state.dispatch_timeout.as_secs())),
    };
    exchange
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OperationRoute, RoutingConfig, ServiceRoute};
    use crate::routing::ServiceBuilder;
    use crate::rpc::{BasicService, DispatchRegistry, ServiceRegistry};

    fn state() -> AppState {
        let mut services = ServiceRegistry::new();
        services.bind_service(Arc::new(
            BasicService::new("user").with_handler("OnLogin", |_| Ok(CanonicalResponse::ok("in"))),
        ));
        let login = OperationRoute {
            command_id: 0,
            request: String::new(),
            response: String::new(),
            handler: "OnLogin".into(),
        };
        let mut routing = RoutingConfig::default();
        routing.patterns.insert(
            "/user".into(),
            ServiceRoute {
                service: "user".into(),
                module_id: 0,
                operations: [("login".to_string(), login)].into_iter().collect(),
            },
        );

        let mut registry = DispatchRegistry::new();
        let report = ServiceBuilder::new(&services).build(routing, &mut registry);
        AppState {
            routes: report.routes,
            reader: Arc::new(RequestReader::anonymous()),
            writer: ResponseWriter::new(),
            dispatcher: Arc::new(registry),
            max_body_size: 1024,
            dispatch_timeout: Duration::from_secs(5),
        }
    }

    fn parts(uri: &str) -> Parts {
        axum::http::Request::builder()
            .uri(uri)
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    #[tokio::test]
    async fn metric_labels_come_from_the_route_table() {
        let state = state();
        let matched = exchange(&state, &parts("/user?opr=login"), Body::empty()).await;
        assert!(matched.outcome.is_ok());
        assert_eq!(matched.metric_labels(), ("/user", "login"));

        for uri in ["/x9f3?opr=login", "/user?opr=a1b2c3", "/user"] {
            let missed = exchange(&state, &parts(uri), Body::empty()).await;
            assert!(missed.outcome.is_err(), "uri {uri}");
            assert_eq!(missed.metric_labels(), (UNMATCHED, UNMATCHED), "uri {uri}");
        }
    }

    #[test]
    fn panic_payloads_are_readable() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("boom"));
        let borrowed: Box<dyn Any + Send> = Box::new("bang");
        let other: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(&*owned), "boom");
        assert_eq!(panic_message(&*borrowed), "bang");
        assert_eq!(panic_message(&*other), "unknown panic");
    }
}
