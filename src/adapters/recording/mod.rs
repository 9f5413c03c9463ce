//! Recording adapters that capture interactions to replay sessions.

pub mod transport;

pub use transport::RecordingTransport;
