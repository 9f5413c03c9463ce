//! Replaying adapter for the `Transport` port.

use std::sync::Mutex;

use crate::ports::transport::{Transport, TransportFuture};
use crate::replay::{Matcher, ReplayRequest, ReplaySession};

/// Serves recorded responses from a session, in recorded order.
pub struct ReplayingTransport {
    session: Mutex<ReplaySession>,
    matcher: Matcher,
}

impl ReplayingTransport {
    /// Create a replaying transport over `session`.
    #[must_use]
    pub fn new(session: ReplaySession, matcher: Matcher) -> Self {
        Self { session: Mutex::new(session), matcher }
    }

    /// Recorded interactions not yet served.
    ///
    /// # Panics
    ///
    /// Panics if the session lock is poisoned.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.session.lock().expect("session lock poisoned").remaining()
    }
}

impl Transport for ReplayingTransport {
    fn send(&self, request: &ReplayRequest) -> TransportFuture<'_> {
        let result = {
            let mut session = self.session.lock().expect("session lock poisoned");
            session.next_match(&self.matcher, request).map(|i| i.response.clone())
        };
        Box::pin(async move { result })
    }
}
