//! Wire payloads for the broker connection
//!
//! Inbound messages are JSON objects with a `type` discriminator and a
//! bearer `token`; outbound messages carry `status`, `type` and a
//! human-readable `message`, plus optional structured `data`.

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Response {
    pub status: &'static str,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Response {
    pub fn success(kind: &str, message: impl Into<String>) -> Self {
        Self {
            status: "success",
            kind: kind.to_string(),
            message: message.into(),
            data: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            kind: "message".to_string(),
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}
