//! Recording adapter for the `Transport` port.

use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::error::Result;
use crate::ports::transport::{SegmentDecoder, Transport, TransportFuture};
use crate::replay::{ReplayRequest, ReplayResponse, SessionRecorder};

/// Records exchanges while delegating to an inner transport.
pub struct RecordingTransport {
    inner: Arc<dyn Transport>,
    decoder: Arc<dyn SegmentDecoder>,
    recorder: Arc<Mutex<SessionRecorder>>,
}

impl RecordingTransport {
    /// Creates a recording transport wrapping `inner`.
    pub fn new(
        inner: Arc<dyn Transport>,
        decoder: Arc<dyn SegmentDecoder>,
        recorder: Arc<Mutex<SessionRecorder>>,
    ) -> Self {
        Self { inner, decoder, recorder }
    }
}

impl Transport for RecordingTransport {
    fn send(&self, request: &ReplayRequest) -> TransportFuture<'_> {
        let request = request.clone();

        Box::pin(async move {
            let response = match self.inner.send(&request).await {
                Ok(response) => decode_segments(self.decoder.as_ref(), response)?,
                Err(e) => {
                    // Nothing came back, so there is nothing to replay later.
                    warn!(method = %request.method, url = %request.url, error = %e, "exchange not recorded");
                    return Err(e);
                }
            };

            {
                let mut guard = self.recorder.lock().expect("recorder lock poisoned");
                guard.record(request, response.clone());
            }
            Ok(response)
        })
    }
}

/// Fills in the decoded counterpart of every wire segment of a successful
/// response. Error bodies are left undecoded.
fn decode_segments(decoder: &dyn SegmentDecoder, mut response: ReplayResponse) -> Result<ReplayResponse> {
    if response.is_error() {
        return Ok(response);
    }
    response.sdk_response_segments =
        response.body_segments.iter().map(|segment| decoder.decode(segment)).collect::<Result<_>>()?;
    Ok(response)
}
