//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.
//! Key spellings used by older deployments (`opr_field`, `pattern`, `req`,
//! ...) are accepted as aliases.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::ordered::unique_keys;

/// Root configuration for the gateway process.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Pattern/operation routing table.
    pub routing: RoutingConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Largest POST body accepted, in bytes.
    pub max_body_size: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Longest wait for a handler's reply, in seconds. Expiry is answered
    /// with `routing.codes.dispatch_timeout`.
    pub request_secs: u64,

    /// How long in-flight requests may drain after shutdown is triggered.
    pub shutdown_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            shutdown_secs: 10,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Routing table: which service answers which URL pattern, and how wire
/// fields are named.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Answer CORS preflights and attach permissive CORS headers.
    #[serde(alias = "is_allow_origin")]
    pub allow_origin: bool,

    /// Field carrying the operation name.
    #[serde(alias = "opr_field")]
    pub operation_field: String,

    /// Field carrying the client token.
    pub token_field: String,

    /// Field carrying the client serial number.
    #[serde(alias = "serial_No_field")]
    pub serial_no_field: String,

    /// Field carrying the operation parameters.
    pub params_field: String,

    /// Response field carrying the result code.
    pub code_field: String,

    /// Response field carrying the result payload.
    pub result_field: String,

    /// Reserved response codes.
    pub codes: ResponseCodes,

    /// URL pattern → service route, in declaration order.
    #[serde(alias = "pattern", deserialize_with = "unique_keys")]
    pub patterns: IndexMap<String, ServiceRoute>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            allow_origin: false,
            operation_field: "opr".to_string(),
            token_field: "token".to_string(),
            serial_no_field: "sno".to_string(),
            params_field: "params".to_string(),
            code_field: "code".to_string(),
            result_field: "result".to_string(),
            codes: ResponseCodes::default(),
            patterns: IndexMap::new(),
        }
    }
}

impl RoutingConfig {
    /// Look up the route bound to a URL pattern.
    pub fn route(&self, pattern: &str) -> Option<&ServiceRoute> {
        self.patterns.get(pattern)
    }

    /// Total number of operations across all routes.
    pub fn operation_count(&self) -> usize {
        self.patterns.values().map(|r| r.operations.len()).sum()
    }

    /// Field names read from a request, labelled for diagnostics.
    pub fn request_field_names(&self) -> [(&'static str, &str); 4] {
        [
            ("operation_field", self.operation_field.as_str()),
            ("token_field", self.token_field.as_str()),
            ("serial_no_field", self.serial_no_field.as_str()),
            ("params_field", self.params_field.as_str()),
        ]
    }

    /// Field names written to a response, labelled for diagnostics.
    pub fn response_field_names(&self) -> [(&'static str, &str); 4] {
        [
            ("operation_field", self.operation_field.as_str()),
            ("serial_no_field", self.serial_no_field.as_str()),
            ("code_field", self.code_field.as_str()),
            ("result_field", self.result_field.as_str()),
        ]
    }
}

/// One service bound to a URL pattern.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServiceRoute {
    /// Identifier resolved through the service registry.
    pub service: String,

    /// Assigned by the service builder; any value in the file is overwritten.
    #[serde(default, alias = "mod")]
    pub module_id: u16,

    /// Operation name → operation route, in declaration order.
    #[serde(default, alias = "opr", deserialize_with = "unique_keys")]
    pub operations: IndexMap<String, OperationRoute>,
}

/// One operation of a service.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OperationRoute {
    /// Assigned by the service builder; any value in the file is overwritten.
    #[serde(default, alias = "cmd")]
    pub command_id: u16,

    /// Request payload shape name (empty when untyped).
    #[serde(default, alias = "req")]
    pub request: String,

    /// Response payload shape name (empty when untyped).
    #[serde(default, alias = "resp")]
    pub response: String,

    /// Handler name looked up on the bound service.
    pub handler: String,
}

/// Reserved response codes written to the `code` field.
///
/// Handler-produced codes share the same field; deployments should keep
/// handler codes clear of these values.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ResponseCodes {
    /// Written in place of a handler's code 0.
    pub success: i32,
    pub unsupported_method: i32,
    pub malformed_encoding: i32,
    pub unknown_pattern: i32,
    pub unsupported_operation: i32,
    pub token_decode_failed: i32,
    pub payload_decode_failed: i32,
    pub unknown_command: i32,
    pub internal_error: i32,
    /// The handler did not answer within `timeouts.request_secs`.
    pub dispatch_timeout: i32,
}

impl Default for ResponseCodes {
    fn default() -> Self {
        Self {
            success: 0,
            unsupported_method: 1001,
            malformed_encoding: 1002,
            unknown_pattern: 1003,
            unsupported_operation: 1004,
            token_decode_failed: 1005,
            payload_decode_failed: 1006,
            unknown_command: 1007,
            internal_error: 1008,
            dispatch_timeout: 1009,
        }
    }
}

impl ResponseCodes {
    /// Every reserved code with its name.
    pub fn all(&self) -> [(&'static str, i32); 10] {
        [
            ("success", self.success),
            ("unsupported_method", self.unsupported_method),
            ("malformed_encoding", self.malformed_encoding),
            ("unknown_pattern", self.unknown_pattern),
            ("unsupported_operation", self.unsupported_operation),
            ("token_decode_failed", self.token_decode_failed),
            ("payload_decode_failed", self.payload_decode_failed),
            ("unknown_command", self.unknown_command),
            ("internal_error", self.internal_error),
            ("dispatch_timeout", self.dispatch_timeout),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config: GatewayConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.routing.operation_field, "opr");
        assert_eq!(config.routing.codes.success, 0);
        assert!(config.routing.patterns.is_empty());
    }

    #[test]
    fn legacy_json_spellings_are_accepted() {
        let json = r#"{
            "routing": {
                "allow_origin": true,
                "opr_field": "op",
                "serial_No_field": "serial",
                "pattern": {
                    "/user": {
                        "service": "user.UserService",
                        "mod": 9,
                        "opr": {
                            "login": { "cmd": 4, "req": "LoginReq", "resp": "LoginResp", "handler": "OnLogin" }
                        }
                    }
                }
            }
        }"#;
        let config: GatewayConfig = serde_json::from_str(json).unwrap();
        let routing = &config.routing;
        assert!(routing.allow_origin);
        assert_eq!(routing.operation_field, "op");
        assert_eq!(routing.serial_no_field, "serial");
        assert_eq!(routing.token_field, "token");

        let route = routing.route("/user").unwrap();
        assert_eq!(route.module_id, 9);
        let login = route.operations.get("login").unwrap();
        assert_eq!(login.command_id, 4);
        assert_eq!(login.request, "LoginReq");
        assert_eq!(login.response, "LoginResp");
        assert_eq!(login.handler, "OnLogin");
    }

    #[test]
    fn toml_routes_keep_declaration_order() {
        let doc = r#"
            [routing.patterns."/b"]
            service = "b"
            [routing.patterns."/b".operations.second]
            handler = "Second"
            [routing.patterns."/b".operations.first]
            handler = "First"

            [routing.patterns."/a"]
            service = "a"
        "#;
        let config: GatewayConfig = toml::from_str(doc).unwrap();
        let routing = &config.routing;
        assert_eq!(routing.patterns.keys().collect::<Vec<_>>(), ["/b", "/a"]);
        let ops = &routing.route("/b").unwrap().operations;
        assert_eq!(ops.keys().collect::<Vec<_>>(), ["second", "first"]);
        assert_eq!(routing.operation_count(), 2);
    }

    #[test]
    fn repeated_pattern_is_rejected() {
        let json = r#"{"patterns": {"/x": {"service": "a"}, "/x": {"service": "b"}}}"#;
        let err = serde_json::from_str::<RoutingConfig>(json).unwrap_err();
        assert!(err.to_string().contains("duplicate key `/x`"));
    }

    #[test]
    fn operation_requires_handler() {
        let json = r#"{"patterns": {"/x": {"service": "s", "operations": {"op": {}}}}}"#;
        assert!(serde_json::from_str::<RoutingConfig>(json).is_err());
    }
}
