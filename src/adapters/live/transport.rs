//! Live adapter for the `Transport` port using reqwest.

use std::collections::BTreeMap;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};
use serde_json::Value;
use tracing::debug;

use crate::error::ReplayError;
use crate::ports::transport::{Transport, TransportFuture};
use crate::replay::{ReplayRequest, ReplayResponse};

const EVENT_STREAM: &str = "text/event-stream";

/// Transport that talks to the real backend.
pub struct LiveTransport {
    client: Client,
}

impl LiveTransport {
    /// Creates a live transport with a default client.
    #[must_use]
    pub fn new() -> Self {
        Self { client: Client::new() }
    }

    /// Creates a live transport around an existing client.
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for LiveTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for LiveTransport {
    fn send(&self, request: &ReplayRequest) -> TransportFuture<'_> {
        let request = request.clone();

        Box::pin(async move {
            let method = Method::from_bytes(request.method.as_bytes()).map_err(|e| {
                ReplayError::Transport(format!("invalid method {:?}: {e}", request.method))
            })?;
            let mut builder = self.client.request(method, &request.url);
            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }
            match request.body_segments.as_slice() {
                [] => {}
                [body] => builder = builder.json(body),
                segments => {
                    return Err(ReplayError::Transport(format!(
                        "live transport sends one body segment, got {}",
                        segments.len()
                    )));
                }
            }

            let mut response = builder.send().await.map_err(|e| {
                ReplayError::Transport(format!("{} {} failed: {e}", request.method, request.url))
            })?;

            let status_code = response.status().as_u16();
            let headers: BTreeMap<String, String> = response
                .headers()
                .iter()
                .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
                .collect();
            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            let mut body = Vec::new();
            while let Some(chunk) = response
                .chunk()
                .await
                .map_err(|e| ReplayError::Transport(format!("failed to read response body: {e}")))?
            {
                body.extend_from_slice(&chunk);
            }

            let body_segments = split_body(content_type.as_deref(), &body);
            debug!(
                method = %request.method,
                url = %request.url,
                status = status_code,
                segments = body_segments.len(),
                "live exchange complete"
            );
            Ok(ReplayResponse {
                status_code,
                headers,
                body_segments,
                sdk_response_segments: Vec::new(),
            })
        })
    }
}

/// Splits a raw body into wire segments: one per `data:` line for event
/// streams, otherwise the whole body as a single segment.
pub(crate) fn split_body(content_type: Option<&str>, body: &[u8]) -> Vec<Value> {
    let text = String::from_utf8_lossy(body);
    if content_type.is_some_and(|ct| ct.starts_with(EVENT_STREAM)) {
        return text
            .lines()
            .filter_map(|line| line.strip_prefix("data:"))
            .map(str::trim)
            .filter(|data| !data.is_empty())
            .map(parse_segment)
            .collect();
    }
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    vec![parse_segment(trimmed)]
}

fn parse_segment(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_stream_yields_one_segment_per_data_line() {
        let body = b"data: {\"n\": 1}\r\n\r\ndata: {\"n\": 2}\n\n: keep-alive\n\ndata: {\"n\": 3}\n\n";
        let segments = split_body(Some("text/event-stream; charset=utf-8"), body);
        assert_eq!(segments, vec![json!({"n": 1}), json!({"n": 2}), json!({"n": 3})]);
    }

    #[test]
    fn plain_json_is_a_single_segment() {
        let segments = split_body(Some("application/json"), br#"{"name": "files/a"}"#);
        assert_eq!(segments, vec![json!({"name": "files/a"})]);
    }

    #[test]
    fn non_json_body_is_kept_as_text() {
        assert_eq!(split_body(None, b"Bad Gateway\n"), vec![json!("Bad Gateway")]);
        assert!(split_body(None, b"  ").is_empty());
    }
}
