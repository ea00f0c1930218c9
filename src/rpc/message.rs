//! Canonical request/response envelopes exchanged with the dispatch layer.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Request handed to the dispatch layer, one per HTTP request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalRequest {
    pub module_id: u16,
    pub command_id: u16,
    /// Client identity produced by the token decoder; 0 when anonymous.
    pub connection_id: u64,
    /// Client correlation id, echoed back untouched.
    pub serial_no: u16,
    /// The params field, exactly as received.
    pub payload: Bytes,
}

impl CanonicalRequest {
    /// Deserialize the payload as JSON.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }
}

/// Response produced by the dispatch layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalResponse {
    pub code: i32,
    pub payload: Bytes,
}

impl CanonicalResponse {
    /// A code-0 response.
    pub fn ok(payload: impl Into<Bytes>) -> Self {
        Self::with_code(0, payload)
    }

    pub fn with_code(code: i32, payload: impl Into<Bytes>) -> Self {
        Self {
            code,
            payload: payload.into(),
        }
    }

    /// A code-0 response carrying `value` as JSON.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_vec(value).map(Self::ok)
    }

    /// The payload as text, replacing invalid UTF-8.
    pub fn payload_text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}
