//! Recorded session data structures.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ReplayError, Result};

/// A recorded session: the ordered exchanges of one case.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReplayFile {
    /// Identifier the session is stored under.
    #[serde(default, alias = "replayID")]
    pub replay_id: String,
    /// Exchanges in the order the client made them.
    #[serde(default)]
    pub interactions: Vec<ReplayInteraction>,
}

/// One request paired with the response it produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReplayInteraction {
    /// Outgoing request.
    pub request: ReplayRequest,
    /// Response the backend sent.
    pub response: ReplayResponse,
}

/// A request as it went over the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReplayRequest {
    /// HTTP method.
    #[serde(default)]
    pub method: String,
    /// Request URL.
    #[serde(default)]
    pub url: String,
    /// Request headers.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Body chunks; one element for non-streaming uploads.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub body_segments: Vec<Value>,
}

/// A response as the backend framed it, plus what the client decoded.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReplayResponse {
    /// HTTP status code.
    #[serde(default = "default_status")]
    pub status_code: u16,
    /// Response headers.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Wire-level body chunks, one per server frame.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub body_segments: Vec<Value>,
    /// Library-level decoded object per wire chunk.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sdk_response_segments: Vec<Value>,
}

const fn default_status() -> u16 {
    200
}

impl ReplayRequest {
    /// A request with no headers and no body.
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self { method: method.into(), url: url.into(), ..Self::default() }
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Appends one body segment.
    #[must_use]
    pub fn with_segment(mut self, segment: Value) -> Self {
        self.body_segments.push(segment);
        self
    }

    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        header_lookup(&self.headers, name)
    }
}

impl ReplayResponse {
    /// A non-streaming response with a single body segment.
    #[must_use]
    pub fn json(status_code: u16, body: Value) -> Self {
        Self { status_code, body_segments: vec![body], ..Self::default() }
    }

    /// Whether the status signals an error the client would raise.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.status_code >= 400
    }

    /// Whether the response was delivered as more than one chunk.
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.body_segments.len() > 1
    }

    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        header_lookup(&self.headers, name)
    }

    /// Human-readable error text: the body's `error.message` (prefixed with
    /// `error.status` when present), else the raw first segment.
    #[must_use]
    pub fn error_message(&self) -> String {
        let Some(body) = self.body_segments.first() else {
            return format!("HTTP {}", self.status_code);
        };
        let error = body.get("error");
        let message = error.and_then(|e| e.get("message")).and_then(Value::as_str);
        let status = error.and_then(|e| e.get("status")).and_then(Value::as_str);
        match (status, message) {
            (Some(status), Some(message)) => format!("{status}: {message}"),
            (None, Some(message)) => message.to_string(),
            _ => body.as_str().map_or_else(|| body.to_string(), str::to_string),
        }
    }
}

fn header_lookup<'a>(headers: &'a BTreeMap<String, String>, name: &str) -> Option<&'a str> {
    headers.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
}

impl ReplayFile {
    /// An empty session for `replay_id`.
    pub fn new(replay_id: impl Into<String>) -> Self {
        Self { replay_id: replay_id.into(), interactions: Vec::new() }
    }

    /// Checks the structural invariants of a loaded session.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::MalformedSession`] when a response carries
    /// decoded segments that are not parallel to its wire segments.
    pub fn validate(&self) -> Result<()> {
        for (index, interaction) in self.interactions.iter().enumerate() {
            let response = &interaction.response;
            let wire = response.body_segments.len();
            let sdk = response.sdk_response_segments.len();
            if sdk != 0 && sdk != wire {
                return Err(ReplayError::MalformedSession {
                    replay_id: self.replay_id.clone(),
                    reason: format!(
                        "interaction #{index} has {wire} body segments but {sdk} sdk response segments"
                    ),
                });
            }
            if interaction.request.method.is_empty() {
                return Err(ReplayError::MalformedSession {
                    replay_id: self.replay_id.clone(),
                    reason: format!("interaction #{index} has no request method"),
                });
            }
        }
        Ok(())
    }
}
