//! CORS gate.
//!
//! Runs before the reader. With `allow_origin` off, preflights are answered
//! with an empty 204 and nothing else runs. With it on, every response
//! allows any origin, requests carrying an `Origin` header also get the
//! allowed methods and headers, and preflights stop here with a 204.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::RoutingConfig;

pub const ALLOW_METHODS: &str = "POST, GET, OPTIONS, PUT, DELETE";
pub const ALLOW_HEADERS: &str =
    "Accept, Content-Type, Content-Length, Accept-Encoding, X-CSRF-Token, Authorization";

pub async fn cors_middleware(
    State(routing): State<Arc<RoutingConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let preflight = request.method() == Method::OPTIONS;

    if !routing.allow_origin {
        if preflight {
            tracing::debug!(path = %request.uri().path(), "Preflight rejected, CORS disabled");
            return StatusCode::NO_CONTENT.into_response();
        }
        return next.run(request).await;
    }

    let has_origin = request.headers().contains_key(header::ORIGIN);
    let mut response = if preflight {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    apply_permissive_headers(response.headers_mut(), has_origin);
    response
}

fn apply_permissive_headers(headers: &mut HeaderMap, has_origin: bool) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    if !has_origin {
        return;
    }
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
}
