//! Port traits defining external boundaries.
//!
//! The harness has a single boundary: the HTTP transport the client under
//! test talks through. Implementations live in `src/adapters/`.

pub mod transport;

pub use transport::{PassthroughDecoder, SegmentDecoder, Transport, TransportFuture};
