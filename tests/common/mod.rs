//! Shared utilities for the gateway integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use rpc_http_gateway::codec::parse_form_encoded;
use rpc_http_gateway::config::{GatewayConfig, OperationRoute, RoutingConfig, ServiceRoute};
use rpc_http_gateway::http::{HttpServer, RequestReader};
use rpc_http_gateway::routing::{BuildReport, ServiceBuilder};
use rpc_http_gateway::rpc::{
    BasicService, CanonicalResponse, DispatchRegistry, HandlerError, ServiceRegistry,
};

fn op(handler: &str, request: &str) -> OperationRoute {
    OperationRoute {
        command_id: 0,
        request: request.to_string(),
        response: String::new(),
        handler: handler.to_string(),
    }
}

/// `/user` bound to the `user` service, plus a route whose service does not
/// exist.
pub fn routing(allow_origin: bool) -> RoutingConfig {
    let mut config = RoutingConfig {
        allow_origin,
        ..RoutingConfig::default()
    };
    config.patterns.insert(
        "/user".into(),
        ServiceRoute {
            service: "user".into(),
            module_id: 0,
            operations: [
                ("login", op("OnLogin", "")),
                ("echo", op("OnEcho", "json")),
                ("whoami", op("OnWhoami", "")),
                ("deny", op("OnDeny", "")),
                ("crash", op("OnCrash", "")),
                ("slow", op("OnSlow", "")),
                ("ghost", op("OnGhost", "")),
            ]
            .into_iter()
            .map(|(name, route)| (name.to_string(), route))
            .collect(),
        },
    );
    config.patterns.insert(
        "/missing".into(),
        ServiceRoute {
            service: "nobody".into(),
            module_id: 0,
            operations: [("login".to_string(), op("OnLogin", ""))].into_iter().collect(),
        },
    );
    config
}

/// The `user` service. Every handler bumps `calls`.
pub fn services(calls: Arc<AtomicUsize>) -> ServiceRegistry {
    let counted = move || {
        let calls = calls.clone();
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
        }
    };

    let (c1, c2, c3, c4, c5, c6) = (
        counted(),
        counted(),
        counted(),
        counted(),
        counted(),
        counted(),
    );
    let service = BasicService::new("user")
        .with_handler("OnLogin", move |_| {
            c1();
            Ok(CanonicalResponse::ok("ok"))
        })
        .with_handler("OnEcho", move |req| {
            c2();
            Ok(CanonicalResponse::ok(req.payload.clone()))
        })
        .with_handler("OnWhoami", move |req| {
            c3();
            Ok(CanonicalResponse::ok(req.connection_id.to_string()))
        })
        .with_handler("OnDeny", move |_| {
            c4();
            Err(HandlerError::new(42, "access denied"))
        })
        .with_handler("OnCrash", move |_| {
            c5();
            panic!("handler exploded")
        })
        .with_handler("OnSlow", move |_| {
            c6();
            std::thread::sleep(Duration::from_secs(3));
            Ok(CanonicalResponse::ok("late"))
        });

    let mut services = ServiceRegistry::new();
    services.bind_service(Arc::new(service));
    services
}

/// A gateway wired the way the binary wires it.
pub struct Harness {
    pub server: HttpServer,
    pub report: BuildReport,
    pub calls: Arc<AtomicUsize>,
}

pub fn harness(config: &GatewayConfig, reader: RequestReader) -> Harness {
    let calls = Arc::new(AtomicUsize::new(0));
    let services = services(calls.clone());
    let mut registry = DispatchRegistry::new();
    registry.register_shape::<serde_json::Value>("json");

    let report = ServiceBuilder::new(&services).build(config.routing.clone(), &mut registry);
    let server = HttpServer::new(config, report.routes.clone(), reader, Arc::new(registry));
    Harness {
        server,
        report,
        calls,
    }
}

pub fn app(allow_origin: bool, reader: RequestReader) -> (Router, Arc<AtomicUsize>) {
    let config = GatewayConfig {
        routing: routing(allow_origin),
        ..GatewayConfig::default()
    };
    let harness = harness(&config, reader);
    (harness.server.router(), harness.calls)
}

/// Drive one request through the router.
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, HeaderMap, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, String::from_utf8(body.to_vec()).unwrap())
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Decoded value of one field of a wire response.
pub fn field(body: &str, name: &str) -> String {
    let (values, error) = parse_form_encoded(body);
    assert!(error.is_none(), "response body is not clean form data: {body}");
    values.get(name).unwrap_or_default().to_string()
}

pub fn code(body: &str) -> i32 {
    field(body, "code").parse().unwrap()
}
