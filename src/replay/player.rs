//! Segment-by-segment playback of a recorded response.

use std::collections::BTreeMap;

use serde_json::Value;

use super::format::ReplayResponse;

/// One replayed chunk: the wire form and, when recorded, its decoded form.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayedSegment {
    /// Position within the response.
    pub index: usize,
    /// Segment exactly as the server framed it.
    pub wire: Value,
    /// Library-level object decoded from `wire`.
    pub decoded: Option<Value>,
}

/// Lazy, one-shot iterator over a response's segments in recorded order.
///
/// Chunk boundaries are kept exactly as recorded; nothing is merged or
/// split. The playback owns its response, so each interaction can be
/// played only once.
#[derive(Debug)]
pub struct Playback {
    status_code: u16,
    headers: BTreeMap<String, String>,
    total: usize,
    next: usize,
    wire: std::vec::IntoIter<Value>,
    decoded: Option<std::vec::IntoIter<Value>>,
}

/// Starts playing `response`.
#[must_use]
pub fn play(response: ReplayResponse) -> Playback {
    let total = response.body_segments.len();
    let decoded = (!response.sdk_response_segments.is_empty())
        .then(|| response.sdk_response_segments.into_iter());
    Playback {
        status_code: response.status_code,
        headers: response.headers,
        total,
        next: 0,
        wire: response.body_segments.into_iter(),
        decoded,
    }
}

impl Playback {
    /// HTTP status of the played response.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Whether the response was delivered in more than one chunk.
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.total > 1
    }

    /// Total number of segments, including those already yielded.
    #[must_use]
    pub fn total_segments(&self) -> usize {
        self.total
    }

    /// Drains the playback into the decoded objects, falling back to the
    /// wire form for segments without a decoded counterpart.
    #[must_use]
    pub fn into_decoded(self) -> Vec<Value> {
        self.map(|segment| segment.decoded.unwrap_or(segment.wire)).collect()
    }
}

impl Iterator for Playback {
    type Item = PlayedSegment;

    fn next(&mut self) -> Option<Self::Item> {
        let wire = self.wire.next()?;
        let decoded = self.decoded.as_mut().and_then(Iterator::next);
        let index = self.next;
        self.next += 1;
        Some(PlayedSegment { index, wire, decoded })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.wire.size_hint()
    }
}

impl ExactSizeIterator for Playback {}
