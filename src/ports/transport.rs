//! HTTP transport port used by the client under test.

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use crate::error::Result;
use crate::replay::{ReplayRequest, ReplayResponse};

/// Boxed future type alias used by [`Transport`] to keep the trait dyn-compatible.
pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<ReplayResponse>> + Send + 'a>>;

/// Sends one HTTP exchange.
pub trait Transport: Send + Sync {
    /// Sends `request` and returns the complete response, with streamed
    /// bodies split into one segment per server frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails before a response arrives.
    /// Error statuses are returned as responses, not errors.
    fn send(&self, request: &ReplayRequest) -> TransportFuture<'_>;
}

/// Turns a wire segment into the object the client library hands its
/// caller.
pub trait SegmentDecoder: Send + Sync {
    /// Decodes one wire segment.
    ///
    /// # Errors
    ///
    /// Returns an error if the segment cannot be decoded.
    fn decode(&self, segment: &Value) -> Result<Value>;
}

/// Decoder that hands segments through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughDecoder;

impl SegmentDecoder for PassthroughDecoder {
    fn decode(&self, segment: &Value) -> Result<Value> {
        Ok(segment.clone())
    }
}
