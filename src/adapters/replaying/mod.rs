//! Replaying adapters that serve recorded interactions.

pub mod transport;

pub use transport::ReplayingTransport;
